use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InvalidArgument,
    StorageFailure,
    Config,
}

/// Structured failure handed to whatever layer presents errors to an operator.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidState(_) => ErrorKind::InvalidState,
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::StorageFailure(_) => ErrorKind::StorageFailure,
            AppError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn report(&self) -> ErrorReport {
        let message = match self {
            AppError::NotFound(msg)
            | AppError::InvalidState(msg)
            | AppError::InvalidArgument(msg)
            | AppError::StorageFailure(msg)
            | AppError::Config(msg) => msg.clone(),
        };

        ErrorReport {
            kind: self.kind(),
            message,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::StorageFailure(format!("malformed record: {err}"))
    }
}
