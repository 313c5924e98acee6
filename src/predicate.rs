//! Named predicates and their evaluation.
//!
//! Rules reference predicates by name, e.g. `is-bigger-than-mb,100`. Names
//! resolve against a closed registry ([`Predicate`]); an unknown name or a
//! bad argument is an error for the rule being evaluated, never a silent
//! `false`.

use crate::category::Category;
use crate::entity::Entity;
use crate::error::RuleError;
use std::fmt;

const BYTES_PER_MB: i64 = 1024 * 1024;

/// Every predicate name the registry understands, in canonical form.
pub const PREDICATE_NAMES: &[&str] = &[
    "is-image",
    "is-picture",
    "is-video",
    "is-music",
    "is-audio",
    "is-document",
    "is-unknown",
    "is-bigger-than",
    "is-smaller-than",
    "is-bigger-than-mb",
    "is-smaller-than-mb",
    "has-artist",
];

/// A predicate name plus its string arguments, as written in a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateInvocation {
    pub name: String,
    pub args: Vec<String>,
}

impl PredicateInvocation {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parses the `name[,arg...]` form used in configuration files.
    ///
    /// ```
    /// use sortwise::predicate::PredicateInvocation;
    ///
    /// let invocation = PredicateInvocation::parse("is-bigger-than-mb, 100");
    /// assert_eq!(invocation.name, "is-bigger-than-mb");
    /// assert_eq!(invocation.args, vec!["100".to_string()]);
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default().to_string();
        let args = parts.map(str::to_string).collect();
        Self { name, args }
    }

    /// The name with `_` normalized to `-`, lowercased.
    fn canonical_name(&self) -> String {
        self.name.trim().to_lowercase().replace('_', "-")
    }
}

impl fmt::Display for PredicateInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, ",{}", arg)?;
        }
        Ok(())
    }
}

/// The closed registry of checks an entity can be tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    IsImage,
    IsVideo,
    IsMusic,
    IsDocument,
    IsUnknown,
    /// Strictly larger than the given number of bytes. May be negative.
    IsBiggerThan(i64),
    /// Strictly smaller than the given number of bytes. May be negative.
    IsSmallerThan(i64),
    /// Only defined for attributed entities.
    HasArtist,
}

impl Predicate {
    /// Resolves an invocation against the registry.
    ///
    /// Megabyte variants resolve to their byte counterparts.
    ///
    /// # Errors
    ///
    /// `UnknownPredicate` for names outside the registry,
    /// `MalformedPredicateArgument` for a wrong argument count or a
    /// non-integer size.
    pub fn resolve(invocation: &PredicateInvocation) -> Result<Self, RuleError> {
        let name = invocation.canonical_name();
        let predicate = match name.as_str() {
            "is-image" | "is-picture" => Predicate::IsImage,
            "is-video" => Predicate::IsVideo,
            "is-music" | "is-audio" => Predicate::IsMusic,
            "is-document" => Predicate::IsDocument,
            "is-unknown" => Predicate::IsUnknown,
            "has-artist" => Predicate::HasArtist,
            "is-bigger-than" => Predicate::IsBiggerThan(size_argument(invocation, 1)?),
            "is-smaller-than" => Predicate::IsSmallerThan(size_argument(invocation, 1)?),
            "is-bigger-than-mb" => {
                Predicate::IsBiggerThan(size_argument(invocation, BYTES_PER_MB)?)
            }
            "is-smaller-than-mb" => {
                Predicate::IsSmallerThan(size_argument(invocation, BYTES_PER_MB)?)
            }
            _ => {
                return Err(RuleError::UnknownPredicate {
                    name: invocation.name.clone(),
                });
            }
        };

        if !predicate.takes_argument() && !invocation.args.is_empty() {
            return Err(RuleError::MalformedPredicateArgument {
                name: invocation.name.clone(),
                reason: format!("expected no arguments, got {}", invocation.args.len()),
            });
        }

        Ok(predicate)
    }

    fn takes_argument(&self) -> bool {
        matches!(self, Predicate::IsBiggerThan(_) | Predicate::IsSmallerThan(_))
    }

    /// Tests the predicate against an entity.
    pub fn check(&self, entity: &Entity) -> Result<bool, RuleError> {
        Ok(match self {
            Predicate::IsImage => entity.category() == Category::Image,
            Predicate::IsVideo => entity.category() == Category::Video,
            Predicate::IsMusic => entity.category() == Category::Music,
            Predicate::IsDocument => entity.category() == Category::Document,
            Predicate::IsUnknown => entity.category() == Category::Unknown,
            Predicate::IsBiggerThan(limit) => i128::from(entity.size()) > i128::from(*limit),
            Predicate::IsSmallerThan(limit) => i128::from(entity.size()) < i128::from(*limit),
            Predicate::HasArtist => match entity.attribution() {
                Some(attribution) => attribution.artist.is_some(),
                None => {
                    return Err(RuleError::UnknownPredicate {
                        name: "has-artist".to_string(),
                    });
                }
            },
        })
    }
}

/// Parses the single integer argument of a size predicate and scales it.
fn size_argument(invocation: &PredicateInvocation, scale: i64) -> Result<i64, RuleError> {
    let malformed = |reason: String| RuleError::MalformedPredicateArgument {
        name: invocation.name.clone(),
        reason,
    };

    let [arg] = invocation.args.as_slice() else {
        return Err(malformed(format!(
            "expected exactly one size argument, got {}",
            invocation.args.len()
        )));
    };
    let value: i64 = arg
        .parse()
        .map_err(|_| malformed(format!("'{}' is not an integer", arg)))?;
    value
        .checked_mul(scale)
        .ok_or_else(|| malformed(format!("'{}' is too large", arg)))
}

/// Anything that can be evaluated against an entity as one step of a rule.
pub trait Condition {
    fn evaluate(&self, entity: &Entity) -> Result<bool, RuleError>;
}

impl Condition for Predicate {
    fn evaluate(&self, entity: &Entity) -> Result<bool, RuleError> {
        self.check(entity)
    }
}

impl Condition for PredicateInvocation {
    fn evaluate(&self, entity: &Entity) -> Result<bool, RuleError> {
        Predicate::resolve(self)?.check(entity)
    }
}

/// Evaluates conditions in order, stopping at the first `false`.
///
/// An empty list is vacuously satisfied. Conditions after the first
/// failing one are neither resolved nor evaluated, so an unknown predicate
/// placed after a failing one does not surface.
pub fn evaluate_all<'a, C, I>(entity: &Entity, conditions: I) -> Result<bool, RuleError>
where
    C: Condition + 'a,
    I: IntoIterator<Item = &'a C>,
{
    for condition in conditions {
        if !condition.evaluate(entity)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ArtistPatterns;
    use std::cell::Cell;

    const TWO_MB: u64 = 2 * 1024 * 1024;

    fn invocation(text: &str) -> PredicateInvocation {
        PredicateInvocation::parse(text)
    }

    struct Counting<'a> {
        result: bool,
        calls: &'a Cell<usize>,
    }

    impl Condition for Counting<'_> {
        fn evaluate(&self, _entity: &Entity) -> Result<bool, RuleError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.result)
        }
    }

    #[test]
    fn test_short_circuit_on_first_false() {
        let entity = Entity::with_size("a.txt", 1).unwrap();
        let first = Cell::new(0);
        let second = Cell::new(0);
        let conditions = [
            Counting {
                result: false,
                calls: &first,
            },
            Counting {
                result: true,
                calls: &second,
            },
        ];

        assert!(!evaluate_all(&entity, &conditions).unwrap());
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
    }

    #[test]
    fn test_empty_list_is_satisfied() {
        let entity = Entity::with_size("a.txt", 1).unwrap();
        let none: [PredicateInvocation; 0] = [];
        assert!(evaluate_all(&entity, &none).unwrap());
    }

    #[test]
    fn test_all_true() {
        let entity = Entity::with_size("song.flac", TWO_MB).unwrap();
        let conditions = [invocation("is-music"), invocation("is-bigger-than-mb,1")];
        assert!(evaluate_all(&entity, &conditions).unwrap());
    }

    #[test]
    fn test_size_predicates_on_two_mb() {
        let entity = Entity::with_size("big.bin", TWO_MB).unwrap();
        let check = |text: &str| invocation(text).evaluate(&entity).unwrap();

        assert!(check("is-bigger-than,1048576"));
        assert!(!check("is-smaller-than-mb,1"));
        assert!(check("is-smaller-than-mb,3"));
        assert!(!check("is-bigger-than-mb,2"));
        assert!(!check("is-smaller-than,2097152"));
    }

    #[test]
    fn test_negative_thresholds() {
        let empty = Entity::with_size("empty.bin", 0).unwrap();
        let check = |text: &str| invocation(text).evaluate(&empty).unwrap();

        assert!(check("is-bigger-than,-5"));
        assert!(check("is-bigger-than-mb,-1"));
        assert!(!check("is-smaller-than,-5"));
        assert!(!check("is-smaller-than,0"));

        let huge = Entity::with_size("huge.bin", u64::MAX).unwrap();
        assert!(invocation("is-bigger-than,9223372036854775807").evaluate(&huge).unwrap());
    }

    #[test]
    fn test_category_predicates_and_aliases() {
        let picture = Entity::with_size("a.JPG", 0).unwrap();
        assert!(invocation("is-picture").evaluate(&picture).unwrap());
        assert!(invocation("is_image").evaluate(&picture).unwrap());
        assert!(!invocation("is-video").evaluate(&picture).unwrap());

        let audio = Entity::with_size("a.ogg", 0).unwrap();
        assert!(invocation("is-audio").evaluate(&audio).unwrap());

        let unknown = Entity::with_size("a.xyz", 0).unwrap();
        assert!(invocation("is-unknown").evaluate(&unknown).unwrap());
        assert!(!invocation("is-document").evaluate(&unknown).unwrap());
    }

    #[test]
    fn test_unknown_predicate_is_error() {
        let entity = Entity::with_size("a.txt", 0).unwrap();
        let result = evaluate_all(&entity, &[invocation("is-purple")]);
        assert!(matches!(result, Err(RuleError::UnknownPredicate { .. })));
    }

    #[test]
    fn test_unknown_after_false_is_not_reached() {
        let entity = Entity::with_size("a.txt", 0).unwrap();
        let conditions = [invocation("is-video"), invocation("is-purple")];
        assert!(!evaluate_all(&entity, &conditions).unwrap());
    }

    #[test]
    fn test_malformed_arguments() {
        let entity = Entity::with_size("a.txt", 0).unwrap();
        for text in [
            "is-bigger-than,abc",
            "is-bigger-than",
            "is-bigger-than,1,2",
            "is-bigger-than-mb,18446744073709551615",
            "is-smaller-than-mb,-9223372036854775807",
            "is-image,extra",
        ] {
            let result = invocation(text).evaluate(&entity);
            assert!(
                matches!(result, Err(RuleError::MalformedPredicateArgument { .. })),
                "{} should be malformed",
                text
            );
        }
    }

    #[test]
    fn test_has_artist_only_on_attributed_entities() {
        let plain = Entity::with_size("Artist - Title.jpg", 0).unwrap();
        assert!(matches!(
            invocation("has-artist").evaluate(&plain),
            Err(RuleError::UnknownPredicate { .. })
        ));

        let attributed = plain.clone().attributed(&ArtistPatterns::default());
        assert!(invocation("has-artist").evaluate(&attributed).unwrap());

        let anonymous = Entity::with_size("Title.jpg", 0)
            .unwrap()
            .attributed(&ArtistPatterns::default());
        assert!(!invocation("has_artist").evaluate(&anonymous).unwrap());
    }

    #[test]
    fn test_invocation_display_round_trips_parse() {
        let parsed = invocation("is-bigger-than,10");
        assert_eq!(parsed.to_string(), "is-bigger-than,10");
        assert_eq!(PredicateInvocation::parse(&parsed.to_string()), parsed);
    }

    #[test]
    fn test_every_registered_name_resolves() {
        for name in PREDICATE_NAMES {
            let args = if name.contains("than") {
                vec!["1".to_string()]
            } else {
                Vec::new()
            };
            assert!(Predicate::resolve(&PredicateInvocation::new(*name, args)).is_ok());
        }
    }
}
