//! Pipeline-level errors. Touchpoint-local failures never surface here;
//! they are recorded as evidence on the context instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OsintError {
    /// A required touchpoint's success predicate stayed false after all retry rounds.
    #[error("required touchpoints failed at stage {stage}: {}", .missing.join(", "))]
    RequiredTouchpointsMissing { stage: u32, missing: Vec<String> },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no collectors configured")]
    NoCollectors,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OsintError {
    /// Ids of the required touchpoints that were never satisfied, if this is a stage abort.
    pub fn missing_touchpoints(&self) -> &[String] {
        match self {
            Self::RequiredTouchpointsMissing { missing, .. } => missing,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, OsintError>;
