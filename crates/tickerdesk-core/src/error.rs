use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Validation and contract errors exposed by `tickerdesk-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,

    #[error("topic label cannot be empty")]
    EmptyTopicLabel,
    #[error("topic label '{label}' is defined more than once")]
    DuplicateTopic { label: String },
    #[error("topic '{label}' contains an empty keyword")]
    EmptyKeyword { label: String },

    #[error("invalid list kind '{value}', expected one of holdings, watch")]
    InvalidListKind { value: String },

    #[error("feed '{label}' has an empty url")]
    EmptyFeedUrl { label: String },

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,

    #[error("config field '{field}' must be greater than zero")]
    ZeroConfigValue { field: &'static str },
    #[error("config field '{field}' must be within {min}..={max}")]
    ConfigOutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read config '{path}': {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Upstream error classification shared by every external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    NoData,
    Malformed,
    Internal,
}

/// Structured upstream error. Never fatal to a refresh: callers record it and move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NoData, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Malformed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message)
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}
