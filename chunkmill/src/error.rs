use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkmillError {
    #[error("Malformed bundle: {0}")]
    MalformedBundle(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChunkmillError>;
