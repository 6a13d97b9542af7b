//! Error types for corkboard

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Custom field not found: {0}")]
    FieldNotFound(String),

    #[error("Board {0} is a template and cannot be changed")]
    TemplateLocked(String),

    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid field type: {0}")]
    InvalidFieldType(String),

    #[error("Invalid activity kind: {0}")]
    InvalidActivityKind(String),

    #[error("Invalid entry type: {0}")]
    InvalidEntryType(String),

    #[error("Board {board} is inconsistent: {reason}")]
    Invariant { board: String, reason: String },

    #[error("Board order is inconsistent: {0}")]
    BoardOrder(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
