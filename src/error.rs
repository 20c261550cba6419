use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum AdapterError {
    // Encoding errors
    Encode(String),

    // Connection errors
    ConnectionClosed,

    // Configuration errors
    Config(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(msg) => write!(f, "Packet encoding error: {}", msg),
            Self::ConnectionClosed => write!(f, "Connection closed unexpectedly"),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for AdapterError {}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Encode(err.to_string())
    }
}

// Generic result type for roomcast
pub type Result<T> = std::result::Result<T, AdapterError>;
