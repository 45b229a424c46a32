/**
 * Error Types
 * One enum per concern; orchestration outcomes live in `orchestrator::outcome`
 */

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure converting between native values and field elements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Value does not fit below the field modulus (or is negative).
    #[error("value {0} is outside the field range")]
    Range(String),

    /// Text is not a base-10 unsigned integer.
    #[error("invalid decimal encoding: {0:?}")]
    Format(String),
}

/// Minutia value outside the circuit's accepted ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("minutia {field} = {value} outside 0..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        max: i64,
    },
}

/// Failure hashing a fingerprint record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Wrong minutia count or wrong number of fields in a minutia.
    #[error("record shape mismatch: {0}")]
    Shape(String),

    /// Flattened record does not fit the hash primitive's single-call arity.
    #[error("{len} inputs exceed the poseidon arity limit of {max}")]
    Capacity { len: usize, max: usize },

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Error reported by the underlying permutation.
    #[error("poseidon: {0}")]
    Primitive(String),
}

/// Failure producing key material or a signature.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("system randomness unavailable")]
    Entropy,

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Failure building or writing match input documents.
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("expected {expected} database entries, got {actual}")]
    DatabaseSize { expected: usize, actual: usize },

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("failed to serialize {document}: {source}")]
    Json {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure reading back assembled documents for an audit.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a valid match input document: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("document lists {records} database records but {keys} keys and {signatures} signatures")]
    Mismatched {
        records: usize,
        keys: usize,
        signatures: usize,
    },
}

/// Request-level failure that prevents the state machine from starting.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("failed to allocate request workspace under {root}: {source}")]
    WorkspaceSetup {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}
