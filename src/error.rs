use std::fmt;
use thiserror::Error;

/// Which side of a comparison a sequence belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceRole {
    Reference,
    Candidate,
}

impl fmt::Display for SequenceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceRole::Reference => f.write_str("reference"),
            SequenceRole::Candidate => f.write_str("candidate"),
        }
    }
}

/// Request-level failures. These are the only errors a caller ever sees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComparisonError {
    #[error("{role} mask sequence is empty")]
    EmptySequence { role: SequenceRole },

    #[error("both mask sequences are empty")]
    BothSequencesEmpty,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ComparisonError>;

/// Recoverable causes that were absorbed by substituting a zero-equivalent value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Raw mask had an unsupported dimensionality or channel layout
    MalformedShape,
    /// Raw mask had a zero-length axis
    EmptyInput,
    /// Mask had no foreground region
    NoContour,
    /// Largest contour enclosed zero area
    ZeroMoment,
    /// Flow field contained NaN or infinite values
    NonFiniteFlow,
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Fallback::MalformedShape => "malformed mask shape",
            Fallback::EmptyInput => "empty mask input",
            Fallback::NoContour => "no foreground contour",
            Fallback::ZeroMoment => "zero-area contour",
            Fallback::NonFiniteFlow => "non-finite flow field",
        };
        f.write_str(text)
    }
}

/// Result of a computation that never fails outright.
///
/// Fatal preconditions are reported through [`Result`]; everything else ends
/// up here, either as a real value or as a substituted one with its cause.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Degraded { value: T, cause: Fallback },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, cause: Fallback) -> Self {
        Outcome::Degraded { value, cause }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn cause(&self) -> Option<Fallback> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Degraded { cause, .. } => Some(*cause),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Success(value) | Outcome::Degraded { value, .. } => value,
        }
    }

    /// Unwrap the value, logging the cause if it was substituted
    pub fn into_value(self, stage: &str) -> T {
        match self {
            Outcome::Success(value) => value,
            Outcome::Degraded { value, cause } => {
                tracing::debug!("{} degraded: {}", stage, cause);
                value
            }
        }
    }
}
