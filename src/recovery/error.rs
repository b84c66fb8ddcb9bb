use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryErrorKind {
    NotFound,
    InvalidInput,
    SendFailure,
    RefreshFailure,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryError {
    pub kind: RecoveryErrorKind,
    pub message: String,
}

impl RecoveryError {
    pub fn new(kind: RecoveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RecoveryError {}

pub fn not_found(message: impl Into<String>) -> RecoveryError {
    RecoveryError::new(RecoveryErrorKind::NotFound, message)
}

pub fn invalid_input(message: impl Into<String>) -> RecoveryError {
    RecoveryError::new(RecoveryErrorKind::InvalidInput, message)
}

pub fn send_failure(message: impl Into<String>) -> RecoveryError {
    RecoveryError::new(RecoveryErrorKind::SendFailure, message)
}

pub fn refresh_failure(message: impl Into<String>) -> RecoveryError {
    RecoveryError::new(RecoveryErrorKind::RefreshFailure, message)
}

pub fn internal_error(message: impl Into<String>) -> RecoveryError {
    RecoveryError::new(RecoveryErrorKind::Internal, message)
}
