use thiserror::Error;

/// Why a single dump line was discarded. Never fatal to a run.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("line has no JSON payload")]
    NoPayload,

    #[error("malformed JSON payload: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has unexpected type (expected {expected})")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid created date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl RecordError {
    /// Short stable label used for per-kind counters
    pub fn label(&self) -> &'static str {
        match self {
            RecordError::NoPayload => "no_payload",
            RecordError::MalformedJson(_) => "malformed_json",
            RecordError::MissingField(_) => "missing_field",
            RecordError::InvalidField { .. } => "invalid_field",
            RecordError::InvalidDate { .. } => "invalid_date",
            RecordError::Store(_) => "store",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("store snapshot is corrupt: {0}")]
    Corrupt(#[source] bincode::Error),

    #[error("store snapshot version {found} is not the supported version {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}
