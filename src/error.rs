//! Architect Error Types
//!
//! 애플리케이션 전역 에러 타입 정의

use serde::Serialize;
use thiserror::Error;

use crate::advisor::AdvisorError;

/// Bedrock Architect 애플리케이션 에러
#[derive(Error, Debug)]
pub enum ArchitectError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Advisory service error: {0}")]
    AdvisoryService(#[from] AdvisorError),

    #[error("Another edit is already in progress")]
    Busy,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ArchitectError {
    pub fn code(&self) -> &'static str {
        match self {
            ArchitectError::InvalidDocument(_) => "INVALID_DOCUMENT",
            ArchitectError::AdvisoryService(_) => "ADVISORY_SERVICE_ERROR",
            ArchitectError::Busy => "BUSY",
            ArchitectError::InvalidOperation(_) => "INVALID_OPERATION",
            ArchitectError::Config(_) => "CONFIG_ERROR",
            ArchitectError::Io(_) => "IO_ERROR",
            ArchitectError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// 커맨드 응답용 직렬화 가능한 에러
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<ArchitectError> for CommandError {
    fn from(error: ArchitectError) -> Self {
        // 어드바이저 에러는 원인(HTTP 상태 등)을 details로 분리
        let details = match &error {
            ArchitectError::AdvisoryService(inner) => inner.details(),
            _ => None,
        };

        CommandError {
            code: error.code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

/// 커맨드 결과 타입
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// 세션 내부 결과 타입
pub type Result<T> = std::result::Result<T, ArchitectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_codes() {
        let err: CommandError = ArchitectError::Busy.into();
        assert_eq!(err.code, "BUSY");
        assert!(err.details.is_none());

        let err: CommandError = ArchitectError::InvalidDocument("expected value".into()).into();
        assert_eq!(err.code, "INVALID_DOCUMENT");
        assert!(err.message.contains("expected value"));
    }

    #[test]
    fn test_advisor_error_details_are_forwarded() {
        let err: CommandError = ArchitectError::from(AdvisorError::Http {
            status: 503,
            message: "UNAVAILABLE: overloaded".into(),
        })
        .into();
        assert_eq!(err.code, "ADVISORY_SERVICE_ERROR");
        assert_eq!(err.details.as_deref(), Some("HTTP 503"));
    }
}
