use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("scan failed: {message}")]
    ScanFailed { message: String },

    #[error("malformed timestamp: {value:?}")]
    MalformedTimestamp { value: String },

    #[error("activity fetch for project {project:?} failed: {source}")]
    IncompleteFetch {
        project: String,
        #[source]
        source: Box<TrackError>,
    },

    #[error("project not found: {id}")]
    ProjectNotFound { id: i64 },

    #[error("projects root not found: {id}")]
    RootNotFound { id: i64 },

    #[error("task not found: {id}")]
    TaskNotFound { id: i64 },

    #[error("task category not found: {id}")]
    CategoryNotFound { id: i64 },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("project folder does not exist: {path}")]
    FolderNotFound { path: String },

    #[error("unsupported activity window: {days} days (expected 7, 30 or 90)")]
    InvalidWindow { days: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TrackError>;
