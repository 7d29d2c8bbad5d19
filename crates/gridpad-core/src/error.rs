use thiserror::Error;

/// Failures reading or writing the system clipboard
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// The browser or OS refused access
    #[error("clipboard access denied: {0}")]
    PermissionDenied(String),
    /// No clipboard is reachable from the current event
    #[error("clipboard unavailable")]
    Unavailable,
    /// The clipboard holds something other than plain text
    #[error("clipboard does not contain text")]
    NonText,
    #[error("clipboard backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by grid operations
#[derive(Debug, Error)]
pub enum GridError {
    #[error("no cell is being edited")]
    NotEditing,

    #[error("invalid grid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid cell key in snapshot: {0:?}")]
    InvalidSnapshotKey(String),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GridError {
    /// Stable machine-readable code for bindings
    pub fn code(&self) -> &'static str {
        match self {
            GridError::NotEditing => "NOT_EDITING",
            GridError::InvalidConfig(_) => "INVALID_CONFIG",
            GridError::InvalidSnapshotKey(_) => "INVALID_SNAPSHOT_KEY",
            GridError::Clipboard(ClipboardError::PermissionDenied(_)) => "CLIPBOARD_DENIED",
            GridError::Clipboard(_) => "CLIPBOARD_ERROR",
            GridError::Json(_) => "JSON_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
