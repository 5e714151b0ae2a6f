use thiserror::Error;
use tickerdesk_core::CoreError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tickerdesk_core::ValidationError),

    #[error("config error: {0}")]
    Config(#[from] CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(CoreError::Validation(_)) => 2,
            Self::Config(CoreError::Serialization(_)) => 4,
            Self::Config(CoreError::ConfigIo { .. }) => 10,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
