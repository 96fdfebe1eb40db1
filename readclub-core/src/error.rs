use thiserror::Error;

use crate::codes::{self, ErrorDomain, FALLBACK_MESSAGE, UNKNOWN_CODE};

/// Crate error for setup-time failures (config, client construction).
/// Request-path failures never use this type; callers of the verb
/// operations only ever see [`ApiError`].
#[derive(Debug, Error)]
pub enum ReadClubError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = std::result::Result<T, ReadClubError>;

/// A failure where no HTTP response was received at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("timeout exceeded")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Other(String),
}

/// Status used when a failure carried no HTTP status.
pub const DEFAULT_STATUS: u16 = 500;

/// The single error shape callers observe, whatever the failure origin.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[{code}] {status}: {message}")]
pub struct ApiError {
    pub code: String,
    pub status: u16,
    pub message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(code: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            status,
            message: message.into(),
        }
    }

    /// Error without a server-assigned code.
    pub fn unknown(status: u16, message: impl Into<String>) -> Self {
        Self::new(UNKNOWN_CODE, status, message)
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    pub fn is_any(&self, codes: &[&str]) -> bool {
        codes.iter().any(|c| self.code == *c)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn domain(&self) -> ErrorDomain {
        ErrorDomain::of(&self.code)
    }

    /// Human-readable message: registry entry, else server message, else a
    /// generic fallback. Never empty.
    pub fn user_message(&self) -> &str {
        if let Some(msg) = codes::message_for(&self.code) {
            return msg;
        }
        if !self.message.trim().is_empty() {
            return &self.message;
        }
        FALLBACK_MESSAGE
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::unknown(DEFAULT_STATUS, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_code_uses_registry_message() {
        let err = ApiError::new("U002", 409, "duplicate");
        assert!(err.is("U002"));
        assert_eq!(err.status, 409);
        assert_eq!(err.user_message(), "이미 사용 중인 닉네임입니다.");
        assert_eq!(err.domain(), ErrorDomain::User);
    }

    #[test]
    fn unregistered_code_falls_back_to_server_message() {
        let err = ApiError::new("Z999", 400, "mystery");
        assert_eq!(err.user_message(), "mystery");
        assert_eq!(err.domain(), ErrorDomain::Unknown);
    }

    #[test]
    fn blank_message_falls_back_to_generic() {
        let err = ApiError::new("Z999", 400, "   ");
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
        let err = ApiError::unknown(500, "");
        assert!(!err.user_message().is_empty());
    }

    #[test]
    fn membership_checks() {
        let err = ApiError::new("G003", 409, "full");
        assert!(err.is_any(&["G002", "G003"]));
        assert!(!err.is_any(&["G002"]));
        assert!(!err.is_any(&[]));
        assert!(!err.is("g003"));
    }

    #[test]
    fn transport_error_converts_with_sentinels() {
        let err: ApiError = TransportError::Timeout.into();
        assert_eq!(err.code, UNKNOWN_CODE);
        assert_eq!(err.status, DEFAULT_STATUS);
        assert_eq!(err.message, "timeout exceeded");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn display_includes_code_and_status() {
        let err = ApiError::new("M004", 410, "closed");
        assert_eq!(err.to_string(), "[M004] 410: closed");
    }
}
