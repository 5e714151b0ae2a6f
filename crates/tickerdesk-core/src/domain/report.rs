use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Item or source that was left out of a batch, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skipped {
    /// Ticker or feed label the failure belongs to.
    pub subject: String,
    pub code: String,
    pub message: String,
}

impl Skipped {
    pub fn new(subject: impl Into<String>, error: &SourceError) -> Self {
        Self {
            subject: subject.into(),
            code: error.code().to_owned(),
            message: error.message().to_owned(),
        }
    }
}

/// How much of a batch made it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Complete,
    Partial,
    Failed,
}

impl BatchStatus {
    /// `produced` items were kept and `skipped` were dropped.
    pub fn from_counts(produced: usize, skipped: usize) -> Self {
        match (produced, skipped) {
            (_, 0) => Self::Complete,
            (0, _) => Self::Failed,
            _ => Self::Partial,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}
