//! Operation Outcomes
//!
//! Every handler ends in exactly one [`Outcome`]: a success payload or an
//! [`ApiError`] carrying a stable [`ErrorCode`]. The wire layer only needs
//! [`Outcome::is_error`] to decide which envelope to render.

use crate::store::ResourceKind;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Success payload handed to the wire layer
pub type Payload = Map<String, Value>;

/// Machine-stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    MissingParameter,
    InvalidParameterValue,
    InvalidParameterCombination,
    /// Id not present in the addressed collection; each kind has its own code
    NotFound(ResourceKind),
    DependencyViolation,
    InvalidStateTransition,
    AlreadyAssociated,
    GatewayNotAttached,
    InternalError,
}

impl ErrorCode {
    /// Wire code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParameter => "MissingParameter",
            Self::InvalidParameterValue => "InvalidParameterValue",
            Self::InvalidParameterCombination => "InvalidParameterCombination",
            Self::NotFound(kind) => kind.not_found_code(),
            Self::DependencyViolation => "DependencyViolation",
            Self::InvalidStateTransition => "IncorrectState",
            Self::AlreadyAssociated => "Resource.AlreadyAssociated",
            Self::GatewayNotAttached => "Gateway.NotAttached",
            Self::InternalError => "InternalError",
        }
    }

    /// HTTP status the wire layer reports for this code
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InternalError => 500,
            _ => 400,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data-dependent failure returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn missing_parameter(name: &str) -> Self {
        Self::new(
            ErrorCode::MissingParameter,
            format!("The request must contain the parameter {}", name),
        )
    }

    pub fn invalid_value(name: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::InvalidParameterValue,
            format!("Value ({}) for parameter {} is invalid", value, name),
        )
    }

    pub fn not_found(kind: ResourceKind, id: &str) -> Self {
        Self::new(
            ErrorCode::NotFound(kind),
            format!("The {} ID '{}' does not exist", kind.display_name(), id),
        )
    }

    pub fn dependency_violation(kind: ResourceKind, id: &str) -> Self {
        Self::new(
            ErrorCode::DependencyViolation,
            format!(
                "The {} '{}' has dependencies and cannot be deleted.",
                kind.display_name(),
                id
            ),
        )
    }

    /// `verb` names the requested transition, e.g. `stopped`
    pub fn incorrect_state(kind: ResourceKind, id: &str, verb: &str) -> Self {
        Self::new(
            ErrorCode::InvalidStateTransition,
            format!(
                "The {} '{}' is not in a state from which it can be {}.",
                kind.display_name(),
                id,
                verb
            ),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Tagged result of one handler invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Payload),
    Error(ApiError),
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Success(_) => None,
            Self::Error(err) => Some(err),
        }
    }

    /// Wire code of the error variant, if any
    pub fn code(&self) -> Option<&'static str> {
        self.error().map(|e| e.code.as_str())
    }
}

impl From<Result<Payload, ApiError>> for Outcome {
    fn from(result: Result<Payload, ApiError>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(err) => Self::Error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_exclusivity() {
        let ok: Outcome = Ok(Payload::new()).into();
        assert!(ok.is_success());
        assert!(!ok.is_error());
        assert!(ok.error().is_none());

        let err: Outcome = Err(ApiError::missing_parameter("ImageId")).into();
        assert!(err.is_error());
        assert!(err.payload().is_none());
        assert_eq!(err.code(), Some("MissingParameter"));
    }

    #[test]
    fn test_not_found_codes_are_per_kind() {
        assert_eq!(
            ErrorCode::NotFound(ResourceKind::Image).as_str(),
            "InvalidAMIID.NotFound"
        );
        assert_eq!(
            ErrorCode::NotFound(ResourceKind::NatGateway).as_str(),
            "NatGatewayNotFound"
        );
        assert_eq!(
            ErrorCode::NotFound(ResourceKind::Subnet).as_str(),
            "InvalidSubnetID.NotFound"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::DependencyViolation.http_status(), 400);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_message_names_only_the_identifier() {
        let err = ApiError::dependency_violation(ResourceKind::Vpc, "vpc-0123");
        assert_eq!(err.code, ErrorCode::DependencyViolation);
        assert!(err.message.contains("vpc-0123"));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::incorrect_state(ResourceKind::Instance, "i-1", "started");
        assert_eq!(
            err.to_string(),
            "IncorrectState: The instance 'i-1' is not in a state from which it can be started."
        );
    }
}
