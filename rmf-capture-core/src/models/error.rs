use std::fmt;

use thiserror::Error;

/// Errors returned by the capture control API.
///
/// Every control operation reports its outcome synchronously. A rejected
/// operation leaves all session state exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid handle")]
    InvalidHandle,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CaptureError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidHandle => ErrorCode::InvalidHandle,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Result code of a control call, with the error payload stripped.
///
/// The conformance oracle compares codes rather than messages so any
/// implementation is free to word its errors as it likes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success,
    InvalidArgument,
    InvalidHandle,
    InvalidState,
    Internal,
}

impl ErrorCode {
    pub fn of<T>(result: &Result<T, CaptureError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => e.code(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidHandle => "INVALID_HANDLE",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_strips_payload() {
        let err = CaptureError::InvalidState("already started".into());
        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert_eq!(err.to_string(), "invalid state: already started");
    }

    #[test]
    fn code_of_result() {
        let ok: Result<(), CaptureError> = Ok(());
        assert_eq!(ErrorCode::of(&ok), ErrorCode::Success);

        let err: Result<(), CaptureError> = Err(CaptureError::InvalidHandle);
        assert_eq!(ErrorCode::of(&err), ErrorCode::InvalidHandle);
        assert_eq!(ErrorCode::of(&err).to_string(), "INVALID_HANDLE");
    }
}
