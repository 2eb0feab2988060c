use displaydoc::Display;
use thiserror::Error;

/// models error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum ModelsError {
    /// invalid identifier string: {0}
    InvalidIdString(String),
    /// invalid identifier length, expected {0} bytes
    InvalidIdLength(usize),
    /// serialization error: {0}
    SerializeError(String),
    /// deserialization error: {0}
    DeserializeError(String),
}
