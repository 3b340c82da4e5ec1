use market::MarketError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Market(#[from] MarketError),

    #[error("invalid log filter '{filter}': {reason}")]
    LogFilter { filter: String, reason: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub(crate) const fn exit_code(&self) -> u8 {
        match self {
            Self::Market(_) => 2,
            Self::LogFilter { .. } => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
