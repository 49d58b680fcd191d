//! Error types for the storage layer.

use std::fmt::{Display, Formatter};

/// Errors that can occur while reading or writing the store.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The backing medium could not be reached (I/O, lock, missing directory).
    Unavailable { message: String },
    /// The stored document or a value could not be (de)serialized.
    Serialization { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { message } => write!(f, "store unavailable: {}", message),
            Self::Serialization { message } => {
                write!(f, "store serialization failure: {}", message)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}
