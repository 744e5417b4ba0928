use thiserror::Error;

/// Shown on the form's error line whenever the entered description or
/// amount fails validation.
pub const VALIDATION_MESSAGE: &str = "Please provide a valid description and amount";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation() -> Self {
        StoreError::Validation(VALIDATION_MESSAGE.to_string())
    }
}
