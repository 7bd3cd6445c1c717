//! Error type shared by the cascade, scanner, scorer and worker pool.
//!
//! Every failure is returned to the caller of the operation that triggered
//! it. Nothing is retried and no partial result escapes; the instance that
//! reported the error stays usable once the precondition is fixed.

/// Coarse classification of [`CascadeError`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Scanner or pool used with an invalid or missing configuration.
    Configuration,
    /// Candidate lifecycle misuse (promotion without trainee, double begin).
    State,
    /// Labeled data that cannot be scored or trained on.
    Data,
    /// Stage (de)serialization failure.
    Codec,
    /// A worker thread went away.
    Worker,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CascadeError {
    ScanNotConfigured,
    InvalidStageCount { requested: usize },
    EmptyImage { width: usize, height: usize },
    InvalidWorkerCount,
    CandidatePending,
    NoCandidate,
    MissingClass { positive: usize, negative: usize },
    FeatureLength { expected: usize, found: usize },
    UnknownStageKind(String),
    Codec(String),
    WorkerDisconnected { worker: usize },
}

impl CascadeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CascadeError::ScanNotConfigured
            | CascadeError::InvalidStageCount { .. }
            | CascadeError::EmptyImage { .. }
            | CascadeError::InvalidWorkerCount => ErrorKind::Configuration,
            CascadeError::CandidatePending | CascadeError::NoCandidate => ErrorKind::State,
            CascadeError::MissingClass { .. } | CascadeError::FeatureLength { .. } => {
                ErrorKind::Data
            }
            CascadeError::UnknownStageKind(_) | CascadeError::Codec(_) => ErrorKind::Codec,
            CascadeError::WorkerDisconnected { .. } => ErrorKind::Worker,
        }
    }
}

impl std::fmt::Display for CascadeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CascadeError::ScanNotConfigured => {
                write!(f, "attempted to scan a frame before configuring output scales")
            }
            CascadeError::InvalidStageCount { requested } => {
                write!(f, "scale stage count {requested} yields no usable step (need 1..=200)")
            }
            CascadeError::EmptyImage { width, height } => {
                write!(f, "cannot build a scale pyramid for a {width}x{height} image")
            }
            CascadeError::InvalidWorkerCount => write!(f, "worker pool needs at least one thread"),
            CascadeError::CandidatePending => {
                write!(f, "a candidate stage is already pending")
            }
            CascadeError::NoCandidate => write!(f, "no candidate stage is pending"),
            CascadeError::MissingClass { positive, negative } => write!(
                f,
                "evaluation needs both classes (positive={positive}, negative={negative})"
            ),
            CascadeError::FeatureLength { expected, found } => {
                write!(f, "feature length mismatch ({found} != {expected})")
            }
            CascadeError::UnknownStageKind(kind) => write!(f, "unknown stage kind '{kind}'"),
            CascadeError::Codec(msg) => write!(f, "stage codec error: {msg}"),
            CascadeError::WorkerDisconnected { worker } => {
                write!(f, "worker {worker} disconnected")
            }
        }
    }
}

impl std::error::Error for CascadeError {}

impl From<serde_json::Error> for CascadeError {
    fn from(err: serde_json::Error) -> Self {
        CascadeError::Codec(err.to_string())
    }
}
