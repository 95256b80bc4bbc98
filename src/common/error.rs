use tch::TchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("IO error: {0}")]
    IOError(String),

    #[error("Tch tensor error: {0}")]
    TchError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Value error: {0}")]
    ValueError(String),

    #[error("Invalid configuration error: {0}")]
    InvalidConfigurationError(String),
}

impl From<std::io::Error> for EmbedderError {
    fn from(error: std::io::Error) -> Self {
        EmbedderError::IOError(error.to_string())
    }
}

impl From<TchError> for EmbedderError {
    fn from(error: TchError) -> Self {
        EmbedderError::TchError(error.to_string())
    }
}

impl From<serde_json::Error> for EmbedderError {
    fn from(error: serde_json::Error) -> Self {
        EmbedderError::JsonError(error.to_string())
    }
}
