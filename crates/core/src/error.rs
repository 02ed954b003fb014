use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SocratesError {
    #[error("Invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error("Invalid response: missing {field}")]
    InvalidResponse { field: &'static str },

    #[error("Unknown question: {id}")]
    UnknownQuestion { id: String },

    #[error("Duplicate timeline id: {id}")]
    DuplicateId { id: String },

    #[error("Unknown bookmark: {slug}")]
    UnknownBookmark { slug: String },

    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: &'static str, action: &'static str },

    #[error("Config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SocratesError {
    pub(crate) fn invalid_duration(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SocratesError>;
