//! File categorization by extension.
//!
//! This module maps file extensions to the broad categories rule predicates
//! test against (`is-image`, `is-music`, ...). The table is static: a file's
//! category depends on its extension and nothing else.
//!
//! # Examples
//!
//! ```
//! use sortwise::category::Category;
//!
//! assert_eq!(Category::from_extension("png"), Category::Image);
//! assert_eq!(Category::from_extension("AIFF"), Category::Music);
//! assert_eq!(Category::from_extension("unknown_type"), Category::Unknown);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Represents a broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, etc.)
    Image,
    /// Video files (MP4, MKV, AVI, etc.)
    Video,
    /// Music files (MP3, FLAC, AIFF, etc.)
    Music,
    /// Documents, text and source files (PDF, TXT, PY, etc.)
    Document,
    /// Any extension missing from the table, including no extension at all
    Unknown,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif"];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "flv", "wmv", "mpg", "mpeg", "m4v", "3gp", "3g2",
];

const MUSIC_EXTENSIONS: &[&str] = &["mp3", "wav", "wma", "ogg", "flac", "aac", "m4a", "aiff"];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf", "txt", "rtf", "odt", "ods", "odp", "odg",
    "odf", "odc", "odb", "csv", "tsv", "html", "htm", "css", "js", "json", "xml", "yml", "yaml",
    "java", "py", "c", "cpp", "h", "hpp", "hxx", "h++", "cs", "php", "sql", "log", "md",
    "markdown", "rst", "tex", "latex", "bib", "bibtex",
];

static CATEGORY_BY_EXTENSION: LazyLock<HashMap<&'static str, Category>> = LazyLock::new(|| {
    let tables = [
        (IMAGE_EXTENSIONS, Category::Image),
        (VIDEO_EXTENSIONS, Category::Video),
        (MUSIC_EXTENSIONS, Category::Music),
        (DOCUMENT_EXTENSIONS, Category::Document),
    ];
    tables
        .iter()
        .flat_map(|(extensions, category)| extensions.iter().map(move |ext| (*ext, *category)))
        .collect()
});

impl Category {
    /// Looks up the category of an extension (without the leading dot).
    ///
    /// Matching is case-insensitive. Unlisted extensions map to
    /// [`Category::Unknown`], never to an error.
    pub fn from_extension(ext: &str) -> Self {
        CATEGORY_BY_EXTENSION
            .get(ext.to_lowercase().as_str())
            .copied()
            .unwrap_or(Category::Unknown)
    }

    /// Returns the lowercase name used in destination templates.
    ///
    /// ```
    /// use sortwise::category::Category;
    ///
    /// assert_eq!(Category::Music.as_str(), "music");
    /// assert_eq!(Category::Unknown.as_str(), "unknown");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Video => "video",
            Category::Music => "music",
            Category::Document => "document",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        assert_eq!(Category::Image.as_str(), "image");
        assert_eq!(Category::Video.as_str(), "video");
        assert_eq!(Category::Music.as_str(), "music");
        assert_eq!(Category::Document.as_str(), "document");
        assert_eq!(Category::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_aiff_is_music() {
        assert_eq!(Category::from_extension("aiff"), Category::Music);
    }

    #[test]
    fn test_unlisted_extension_is_unknown() {
        assert_eq!(Category::from_extension("unknown_type"), Category::Unknown);
        assert_eq!(Category::from_extension(""), Category::Unknown);
    }

    #[test]
    fn test_extension_lookup_case_insensitive() {
        assert_eq!(Category::from_extension("JPG"), Category::Image);
        assert_eq!(Category::from_extension("Mkv"), Category::Video);
        assert_eq!(Category::from_extension("PDF"), Category::Document);
    }

    #[test]
    fn test_each_table_is_reachable() {
        for ext in IMAGE_EXTENSIONS {
            assert_eq!(Category::from_extension(ext), Category::Image);
        }
        for ext in VIDEO_EXTENSIONS {
            assert_eq!(Category::from_extension(ext), Category::Video);
        }
        for ext in MUSIC_EXTENSIONS {
            assert_eq!(Category::from_extension(ext), Category::Music);
        }
        for ext in DOCUMENT_EXTENSIONS {
            assert_eq!(Category::from_extension(ext), Category::Document);
        }
    }
}
