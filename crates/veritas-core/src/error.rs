use thiserror::Error;

/// Errors that can occur anywhere in the Veritas pipeline.
///
/// Every variant is fatal: the pipeline never retries or substitutes defaults.
#[derive(Debug, Error)]
pub enum VeritasError {
    /// The dataset is missing expected columns or contains malformed values.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// A configuration value is out of its valid range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A model or vectorizer artifact could not be written or read back.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The text handed to the predictor is empty or whitespace-only.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// The numerical framework rejected an operation (shape mismatch, dtype, ...).
    #[error("model error: {0}")]
    Model(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<candle_core::Error> for VeritasError {
    fn from(err: candle_core::Error) -> Self {
        VeritasError::Model(err.to_string())
    }
}

/// Result type alias for Veritas operations.
pub type Result<T> = std::result::Result<T, VeritasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = VeritasError::DataFormat("missing column `title`".into());
        assert_eq!(err.to_string(), "data format error: missing column `title`");

        let err = VeritasError::Configuration("test_size must be in (0, 1)".into());
        assert!(err.to_string().starts_with("configuration error"));

        let err = VeritasError::EmptyInput;
        assert_eq!(err.to_string(), "input is empty or whitespace-only");
    }

    #[test]
    fn candle_errors_become_model_errors() {
        let err: VeritasError = candle_core::Error::Msg("shape mismatch".into()).into();
        assert!(matches!(err, VeritasError::Model(ref m) if m.contains("shape mismatch")));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VeritasError>();
    }
}
