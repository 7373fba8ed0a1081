use std::fmt;
use thiserror::Error;

/// The fork-join phase an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reduce,
    Scale,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Reduce => "reduce",
            Phase::Scale => "scale",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a normalize call can fail.
///
/// Precondition variants are returned before any thread is spawned. Phase
/// variants mean the phase failed as a whole: no partial sum is ever returned
/// and a scaled vector is never reported as a success.
#[derive(Error, Debug)]
pub enum NormError {
    #[error("Thread count must be at least 1")]
    ZeroThreads,

    #[error("Cannot normalize an empty vector")]
    EmptyVector,

    #[error("Thread count {threads} exceeds vector length {len}")]
    TooManyThreads { threads: usize, len: usize },

    #[error("Vector length {actual} does not match partition length {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Failed to spawn {phase} worker {task}: {source}")]
    Spawn {
        phase: Phase,
        task: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("{phase} worker {task} panicked")]
    WorkerPanicked { phase: Phase, task: usize },

    #[error("{phase} phase cancelled")]
    Cancelled { phase: Phase },

    #[error("Vector has zero norm")]
    ZeroNorm,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl NormError {
    /// True for errors raised before any worker thread existed.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            NormError::ZeroThreads
                | NormError::EmptyVector
                | NormError::TooManyThreads { .. }
                | NormError::LengthMismatch { .. }
                | NormError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NormError>;
