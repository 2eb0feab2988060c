use displaydoc::Display;
use thiserror::Error;

/// database error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum DbError {
    /// backend error: {0}
    BackendError(String),
    /// corrupted data: {0}
    CorruptedData(String),
    /// unknown column family: {0}
    UnknownColumnFamily(String),
}
