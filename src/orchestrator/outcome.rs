/**
 * Verification Outcomes
 * Terminal result of a match request and its HTTP rendering
 */

use axum::http::StatusCode;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeKind {
    Verified,
    InvalidInputFormat,
    WitnessComputationFailed,
    ProofGenerationFailed,
    ProofInvalid,
    ResourceExhausted,
    UnknownFailure,
}

impl OutcomeKind {
    /// Failures the caller caused: malformed uploads, or a statement that is
    /// simply false (the records do not match).
    pub fn is_caller_fault(self) -> bool {
        matches!(self, Self::InvalidInputFormat | Self::ProofInvalid)
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::Verified => StatusCode::OK,
            kind if kind.is_caller_fault() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Terminal result of one match request. Produced once; never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub kind: OutcomeKind,
    pub message: String,
    pub detail: Option<String>,
}

impl VerificationOutcome {
    pub fn new(kind: OutcomeKind, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn verified() -> Self {
        Self {
            kind: OutcomeKind::Verified,
            message: "Fingerprint match verification successful.".into(),
            detail: None,
        }
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(OutcomeKind::InvalidInputFormat, "Invalid Input File Format", detail)
    }

    /// Local I/O failure between workspace allocation and pipeline exit.
    pub fn processing_error(detail: impl Into<String>) -> Self {
        Self::new(
            OutcomeKind::UnknownFailure,
            "Server Error During Processing",
            detail,
        )
    }

    pub fn is_verified(&self) -> bool {
        self.kind == OutcomeKind::Verified
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn response(&self) -> MatchResponse {
        MatchResponse {
            verified: self.is_verified(),
            message: self.message.clone(),
            error: self.detail.clone(),
        }
    }
}

/// Body returned to the caller of the match operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct MatchResponse {
    pub verified: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}
