/// Error type for region edits and schematic handling.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("You have not selected enough vertices.")]
    IncompleteSelection,
    #[error("You have copied nothing into your clipboard.")]
    EmptyClipboard,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Corrupt schematic: {0}")]
    CorruptSchematic(String),
    #[error("Unsupported schematic version: {0}")]
    UnsupportedVersion(String),
    #[error("Schematic is not loaded")]
    NotLoaded,
    #[error("Schematic has already been invalidated")]
    AlreadyInvalidated,
    #[error("An operation is already in progress.")]
    OperationInProgress,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EditError::InvalidArgument(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        EditError::CorruptSchematic(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EditError>;
