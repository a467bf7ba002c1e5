//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("No evaluator for language '{0}'")]
    NoEvaluator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
