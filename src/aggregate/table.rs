//! Sort state and projection for a project's file inventory table.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::classify::{classify, FileCategory};
use crate::aggregate::timestamp::parse_instant;
use crate::models::FileRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Filename,
    Size,
    LastModified,
}

impl SortField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Size => "size",
            Self::LastModified => "last_modified",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "filename" | "name" => Some(Self::Filename),
            "size" => Some(Self::Size),
            "last_modified" | "modified" => Some(Self::LastModified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Current column and direction of the file table. Defaults to filename, ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    #[must_use]
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header click: the active column flips direction, another column starts ascending.
    #[must_use]
    pub fn toggle(self, field: SortField) -> Self {
        if field == self.field {
            Self::new(field, self.direction.flipped())
        } else {
            Self::new(field, SortDirection::Asc)
        }
    }
}

fn modified_at(file: &FileRecord) -> Option<DateTime<Utc>> {
    parse_instant(&file.last_modified).ok()
}

fn compare(field: SortField, a: &FileRecord, b: &FileRecord) -> Ordering {
    match field {
        SortField::Filename => a.filename.to_lowercase().cmp(&b.filename.to_lowercase()),
        SortField::Size => a.size.cmp(&b.size),
        // Unparseable times are `None` and sort before every valid instant.
        SortField::LastModified => modified_at(a).cmp(&modified_at(b)),
    }
}

/// Sorted copy of `files`; the input is left untouched.
///
/// Ascending is a stable sort, so equal keys keep their input order.
/// Descending is the exact reverse of the ascending result.
#[must_use]
pub fn sort_files(files: &[FileRecord], state: SortState) -> Vec<FileRecord> {
    let mut sorted = files.to_vec();
    sorted.sort_by(|a, b| compare(state.field, a, b));
    if state.direction == SortDirection::Desc {
        sorted.reverse();
    }
    sorted
}

/// One table row: the record and its display category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRow {
    #[serde(flatten)]
    pub file: FileRecord,
    pub category: FileCategory,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileTableQuery {
    pub sort: SortState,
    /// Restrict rows to one category.
    pub category: Option<FileCategory>,
}

/// Classified, optionally category-filtered and sorted table rows.
#[must_use]
pub fn file_table(files: &[FileRecord], query: &FileTableQuery) -> Vec<FileRow> {
    sort_files(files, query.sort)
        .into_iter()
        .filter_map(|file| {
            let category = classify(&file.filename);
            if query.category.is_some_and(|c| c != category) {
                return None;
            }
            Some(FileRow {
                file,
                category,
                color: category.color(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64, modified: &str) -> FileRecord {
        FileRecord::new(name.into(), name.into(), size, modified.into())
    }

    fn names(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.filename.as_str()).collect()
    }

    #[test]
    fn filename_sort_is_case_insensitive_and_stable() {
        let files = vec![
            file("b.txt", 1, "2024-01-01T00:00:00Z"),
            file("a.txt", 2, "2024-01-01T00:00:00Z"),
            file("B.TXT", 3, "2024-01-01T00:00:00Z"),
        ];
        let asc = sort_files(&files, SortState::default());
        assert_eq!(names(&asc), ["a.txt", "b.txt", "B.TXT"]);

        let desc = sort_files(&files, SortState::default().toggle(SortField::Filename));
        assert_eq!(names(&desc), ["B.TXT", "b.txt", "a.txt"]);

        assert_eq!(names(&files), ["b.txt", "a.txt", "B.TXT"]);
    }

    #[test]
    fn size_sorts_numerically() {
        let files = vec![
            file("big", 1_000, ""),
            file("small", 9, ""),
            file("mid", 100, ""),
        ];
        let asc = sort_files(&files, SortState::new(SortField::Size, SortDirection::Asc));
        assert_eq!(names(&asc), ["small", "mid", "big"]);
    }

    #[test]
    fn last_modified_sorts_by_instant_with_malformed_first() {
        let files = vec![
            file("late", 1, "2024-03-01T10:00:00+02:00"),
            file("broken", 1, "someday"),
            file("early", 1, "2024-03-01T09:00:00Z"),
        ];
        let asc = sort_files(
            &files,
            SortState::new(SortField::LastModified, SortDirection::Asc),
        );
        // 10:00+02:00 is 08:00Z, before 09:00Z.
        assert_eq!(names(&asc), ["broken", "late", "early"]);
    }

    #[test]
    fn toggle_flips_or_resets() {
        let s = SortState::default();
        assert_eq!(s.toggle(SortField::Filename).direction, SortDirection::Desc);
        assert_eq!(
            s.toggle(SortField::Filename).toggle(SortField::Filename),
            SortState::default()
        );
        let moved = s.toggle(SortField::Filename).toggle(SortField::Size);
        assert_eq!(moved, SortState::new(SortField::Size, SortDirection::Asc));
    }

    #[test]
    fn table_classifies_and_filters_by_category() {
        let files = vec![
            file("photo.png", 1, ""),
            file("notes.txt", 1, ""),
            file("cover.JPG", 1, ""),
        ];
        let all = file_table(&files, &FileTableQuery::default());
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].file.filename, "cover.JPG");
        assert_eq!(all[0].category, FileCategory::Image);
        assert_eq!(all[1].color, "primary");

        let images = file_table(
            &files,
            &FileTableQuery {
                category: Some(FileCategory::Image),
                ..Default::default()
            },
        );
        let rows: Vec<&str> = images.iter().map(|r| r.file.filename.as_str()).collect();
        assert_eq!(rows, ["cover.JPG", "photo.png"]);
    }

    #[test]
    fn sort_field_parse() {
        assert_eq!(SortField::parse("size"), Some(SortField::Size));
        assert_eq!(SortField::parse("modified"), Some(SortField::LastModified));
        assert_eq!(SortField::parse("owner"), None);
        assert_eq!(SortField::LastModified.as_str(), "last_modified");
    }
}
