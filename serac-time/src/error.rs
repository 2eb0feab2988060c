use displaydoc::Display;
use thiserror::Error;

/// time error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    /// error converting time
    ConversionError,
    /// time overflow error
    TimeOverflowError,
    /// checked operation error: {0}
    CheckedOperationError(String),
}
