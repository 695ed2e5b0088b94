use crate::wallet::provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
    #[error("io_error - {0}")]
    Io(String),
    #[error("quota_exceeded - {0}")]
    QuotaExceeded(String),
    #[error("provider_error - {0}")]
    Provider(#[from] ProviderError),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn quota_exceeded<M: Into<String>>(message: M) -> Self {
        Self::QuotaExceeded(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::Provider(_) => "provider_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::Io(message)
            | Self::QuotaExceeded(message) => message.clone(),
            Self::Provider(err) => err.friendly_message(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidData(err.to_string())
    }
}
