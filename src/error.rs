/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Whether a batch should abort on this error instead of skipping the item
    ///
    /// Only caller misconfiguration is fatal. Everything else is scoped to the
    /// single record or title that produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::InvalidParameter(_) | AppError::Config(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_is_fatal() {
        assert!(AppError::InvalidParameter("num_users".to_string()).is_fatal());
        assert!(AppError::Config("missing".to_string()).is_fatal());
    }

    #[test]
    fn test_item_errors_are_not_fatal() {
        assert!(!AppError::Schema("missing id".to_string()).is_fatal());
        assert!(!AppError::UpstreamUnavailable("timeout".to_string()).is_fatal());
        assert!(!AppError::ExternalApi("503".to_string()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Schema("payload has no title".to_string());
        assert_eq!(err.to_string(), "Schema error: payload has no title");
    }
}
