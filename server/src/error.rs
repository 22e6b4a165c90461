use protocol::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Framing error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unknown handler: {0}")]
    UnknownHandler(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
