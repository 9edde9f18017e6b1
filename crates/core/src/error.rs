#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration: {var}: {message}")]
    Config { var: &'static str, message: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
