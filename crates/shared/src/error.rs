use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Load,
    /// Server rejected the submitted fields with a 400 re-render.
    Validation,
    Submission,
    /// 2xx JSON envelope carrying `success: false`.
    Logical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct FailureException {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureException {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<Failure> for FailureException {
    fn from(value: Failure) -> Self {
        Self {
            kind: value.kind,
            message: value.message,
        }
    }
}
