//! Destination templates.
//!
//! A destination such as `music/{artist}/{display_name}.{extension}` is
//! kept as written and expanded against an entity only when the file is
//! about to be relocated, so a resolved destination can be previewed in a
//! dry run without being committed.
//!
//! Supported placeholders: `{name}`, `{base_name}`, `{extension}`,
//! `{category}`, `{path}`, `{parent}`, `{artist}`, `{display_name}` and
//! `{name_with_artist}`. `{{` and `}}` produce literal braces.

use crate::entity::Entity;
use crate::error::RuleError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Name,
    BaseName,
    Extension,
    Category,
    Path,
    Parent,
    Artist,
    DisplayName,
    NameWithArtist,
}

impl Placeholder {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "name" => Placeholder::Name,
            "base_name" => Placeholder::BaseName,
            "extension" => Placeholder::Extension,
            "category" => Placeholder::Category,
            "path" => Placeholder::Path,
            "parent" => Placeholder::Parent,
            "artist" => Placeholder::Artist,
            "display_name" => Placeholder::DisplayName,
            "name_with_artist" => Placeholder::NameWithArtist,
            _ => return None,
        })
    }

    fn key(&self) -> &'static str {
        match self {
            Placeholder::Name => "name",
            Placeholder::BaseName => "base_name",
            Placeholder::Extension => "extension",
            Placeholder::Category => "category",
            Placeholder::Path => "path",
            Placeholder::Parent => "parent",
            Placeholder::Artist => "artist",
            Placeholder::DisplayName => "display_name",
            Placeholder::NameWithArtist => "name_with_artist",
        }
    }

    /// The value of this placeholder for `entity`, or `None` when the entity lacks it.
    fn value(&self, entity: &Entity) -> Option<String> {
        match self {
            Placeholder::Name => Some(entity.name().to_string()),
            Placeholder::BaseName => Some(entity.base_name().to_string()),
            Placeholder::Extension => Some(entity.extension().to_string()),
            Placeholder::Category => Some(entity.category().to_string()),
            Placeholder::Path => Some(entity.path().to_string_lossy().to_string()),
            Placeholder::Parent => Some(
                entity
                    .path()
                    .parent()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default(),
            ),
            Placeholder::Artist => entity.artist().map(str::to_string),
            Placeholder::DisplayName => entity.attribution().map(|a| a.display_name.clone()),
            Placeholder::NameWithArtist => entity.attribution().map(|a| a.name_with_artist()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A destination path relative to the destination root, with placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTemplate {
    raw: String,
}

impl DestinationTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Checks that the template parses and names only known placeholders.
    pub fn validate(&self) -> Result<(), RuleError> {
        self.segments().map(|_| ())
    }

    /// Expands the template for `entity`.
    ///
    /// ```
    /// use sortwise::entity::Entity;
    /// use sortwise::template::DestinationTemplate;
    ///
    /// let entity = Entity::with_size("inbox/report.pdf", 0).unwrap();
    /// let template = DestinationTemplate::new("{category}/{base_name}.{extension}");
    /// assert_eq!(template.expand(&entity).unwrap(), "document/report.pdf");
    /// ```
    ///
    /// # Errors
    ///
    /// `UnknownPlaceholder` or `UnbalancedBrace` for a bad template,
    /// `MissingAttribute` when the entity does not have an attribute the
    /// template needs (an artist on a plain file, for instance).
    pub fn expand(&self, entity: &Entity) -> Result<String, RuleError> {
        let mut expanded = String::with_capacity(self.raw.len());
        for segment in self.segments()? {
            match segment {
                Segment::Literal(text) => expanded.push_str(&text),
                Segment::Placeholder(placeholder) => {
                    let value =
                        placeholder
                            .value(entity)
                            .ok_or_else(|| RuleError::MissingAttribute {
                                template: self.raw.clone(),
                                attribute: placeholder.key().to_string(),
                                name: entity.name().to_string(),
                            })?;
                    expanded.push_str(&value);
                }
            }
        }
        Ok(expanded)
    }

    fn segments(&self) -> Result<Vec<Segment>, RuleError> {
        let unbalanced = || RuleError::UnbalancedBrace {
            template: self.raw.clone(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = self.raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => return Err(unbalanced()),
                            Some(c) => key.push(c),
                        }
                    }
                    let placeholder = Placeholder::from_key(key.trim()).ok_or_else(|| {
                        RuleError::UnknownPlaceholder {
                            template: self.raw.clone(),
                            placeholder: key.clone(),
                        }
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(placeholder));
                }
                '}' => return Err(unbalanced()),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(segments)
    }
}

impl fmt::Display for DestinationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for DestinationTemplate {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ArtistPatterns;

    fn plain(path: &str) -> Entity {
        Entity::with_size(path, 0).unwrap()
    }

    fn attributed(path: &str) -> Entity {
        plain(path).attributed(&ArtistPatterns::default())
    }

    #[test]
    fn test_plain_placeholders() {
        let entity = plain("in/holiday.mp4");
        let template = DestinationTemplate::new("{category}/{base_name}-{extension}/{name}");
        assert_eq!(
            template.expand(&entity).unwrap(),
            "video/holiday-mp4/holiday.mp4"
        );
    }

    #[test]
    fn test_path_and_parent() {
        let entity = plain("in/sub/a.txt");
        assert_eq!(
            DestinationTemplate::new("{parent}|{path}")
                .expand(&entity)
                .unwrap(),
            "in/sub|in/sub/a.txt"
        );
    }

    #[test]
    fn test_template_without_placeholders() {
        let entity = plain("a.txt");
        assert_eq!(
            DestinationTemplate::new("misc/fixed.txt")
                .expand(&entity)
                .unwrap(),
            "misc/fixed.txt"
        );
    }

    #[test]
    fn test_escaped_braces() {
        let entity = plain("a.txt");
        assert_eq!(
            DestinationTemplate::new("{{x}}/{name}")
                .expand(&entity)
                .unwrap(),
            "{x}/a.txt"
        );
    }

    #[test]
    fn test_artist_placeholders() {
        let entity = attributed("TestArtist - Testpicture.jpg");
        let template = DestinationTemplate::new("{artist}/{display_name}.{extension}");
        assert_eq!(
            template.expand(&entity).unwrap(),
            "TestArtist/Testpicture.jpg"
        );
        assert_eq!(
            DestinationTemplate::new("{name_with_artist}")
                .expand(&entity)
                .unwrap(),
            "TestArtist - Testpicture"
        );
    }

    #[test]
    fn test_artist_on_plain_entity_is_error() {
        let entity = plain("TestArtist - Testpicture.jpg");
        let result = DestinationTemplate::new("{artist}/{name}").expand(&entity);
        assert!(matches!(
            result,
            Err(RuleError::MissingAttribute { ref attribute, .. }) if attribute == "artist"
        ));
    }

    #[test]
    fn test_absent_artist_is_error_but_display_name_is_not() {
        let entity = attributed("Testpicture made with TestArtist.jpg");
        assert!(
            DestinationTemplate::new("{artist}")
                .expand(&entity)
                .is_err()
        );
        assert_eq!(
            DestinationTemplate::new("{display_name}")
                .expand(&entity)
                .unwrap(),
            "Testpicture made with TestArtist"
        );
    }

    #[test]
    fn test_unknown_placeholder() {
        let template = DestinationTemplate::new("{obj.base_name}");
        assert!(matches!(
            template.validate(),
            Err(RuleError::UnknownPlaceholder { .. })
        ));
    }

    #[test]
    fn test_unbalanced_braces() {
        for raw in ["{name", "name}", "{na{me}"] {
            assert!(matches!(
                DestinationTemplate::new(raw).validate(),
                Err(RuleError::UnbalancedBrace { .. })
            ));
        }
    }
}
