//! Filename-extension classification into display categories.

use serde::{Deserialize, Serialize};

const DOCUMENT: &[&str] = &["pdf", "doc", "docx", "txt", "rtf", "odt"];
const IMAGE: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];
const SPREADSHEET: &[&str] = &["xls", "xlsx", "csv", "ods"];
const PRESENTATION: &[&str] = &["ppt", "pptx", "odp"];
const CODE: &[&str] = &["html", "css", "js", "py", "java", "c", "cpp", "php", "sql"];
const ARCHIVE: &[&str] = &["zip", "rar", "tar", "gz", "7z"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Document,
    Image,
    Spreadsheet,
    Presentation,
    Code,
    Archive,
    Other,
}

impl FileCategory {
    pub const ALL: [Self; 7] = [
        Self::Document,
        Self::Image,
        Self::Spreadsheet,
        Self::Presentation,
        Self::Code,
        Self::Archive,
        Self::Other,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Image => "Image",
            Self::Spreadsheet => "Spreadsheet",
            Self::Presentation => "Presentation",
            Self::Code => "Code",
            Self::Archive => "Archive",
            Self::Other => "Other",
        }
    }

    /// Colour tag for the category badge.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Document => "primary",
            Self::Image => "success",
            Self::Spreadsheet => "warning",
            Self::Presentation => "info",
            Self::Code => "secondary",
            Self::Archive => "dark",
            Self::Other => "light",
        }
    }

    /// Parse a category name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Document => DOCUMENT,
            Self::Image => IMAGE,
            Self::Spreadsheet => SPREADSHEET,
            Self::Presentation => PRESENTATION,
            Self::Code => CODE,
            Self::Archive => ARCHIVE,
            Self::Other => &[],
        }
    }
}

/// Lowercased text after the last `.`; empty when there is none or the only
/// dot leads the name (`.gitignore`).
#[must_use]
pub fn extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename[idx + 1..].to_lowercase(),
        _ => String::new(),
    }
}

/// Category of a filename. Total: unknown or missing extensions are `Other`.
#[must_use]
pub fn classify(filename: &str) -> FileCategory {
    let ext = extension(filename);
    if ext.is_empty() {
        return FileCategory::Other;
    }
    FileCategory::ALL
        .into_iter()
        .find(|c| c.extensions().contains(&ext.as_str()))
        .unwrap_or(FileCategory::Other)
}
