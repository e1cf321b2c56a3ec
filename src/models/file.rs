use serde::{Deserialize, Serialize};

/// One file of a project's inventory as of the last scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecord {
    /// Row ID (0 if not yet persisted).
    pub id: i64,
    /// Owning project ID.
    pub project: i64,
    /// Project-relative path (forward slashes).
    pub path: String,
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time as sent on the wire.
    pub last_modified: String,
    /// SHA-256 of the contents, when hashing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
}

impl FileRecord {
    #[must_use]
    pub fn new(path: String, filename: String, size: u64, last_modified: String) -> Self {
        Self {
            id: 0,
            project: 0,
            path,
            filename,
            size,
            last_modified,
            file_hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_record_new_sets_zero_id() {
        let f = FileRecord::new(
            "scans/page-001.tif".into(),
            "page-001.tif".into(),
            2048,
            "2024-01-02T10:00:00Z".into(),
        );
        assert_eq!(f.id, 0);
        assert_eq!(f.filename, "page-001.tif");
        assert_eq!(f.size, 2048);
        assert!(f.file_hash.is_none());
    }

    #[test]
    fn deserializes_server_shape() {
        let json = r#"{"id": 9, "path": "a/b.pdf", "filename": "b.pdf", "size": 10,
                       "last_modified": "2024-01-02T10:00:00Z", "file_hash": null,
                       "created_at": "2024-01-01T00:00:00Z"}"#;
        let f: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(f.id, 9);
        assert_eq!(f.project, 0);
        assert_eq!(f.path, "a/b.pdf");
    }
}
