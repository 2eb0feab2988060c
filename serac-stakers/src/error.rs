use displaydoc::Display;
use serac_db_exports::DbError;
use serac_serialization::SerializeError;
use serac_time::TimeError;
use thiserror::Error;

/// stakers result
pub type StakersResult<T, E = StakersError> = core::result::Result<T, E>;

/// stakers error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum StakersError {
    /// Generic error: {0}
    GenericError(String),
    /// MalformedKey: persisted diff key cannot be decoded: {0}
    MalformedKey(String),
    /// MalformedValue: persisted diff value cannot be decoded: {0}
    MalformedValue(String),
    /// MissingPublicKey: {0}
    MissingPublicKey(String),
    /// StakerNotFound: {0}
    StakerNotFound(String),
    /** HeightUnavailable: trying to reconstruct the validator set at
    height {0} which is after the latest applied height */
    HeightUnavailable(u64),
    /// OverflowError: {0}
    OverflowError(String),
    /// ContainerInconsistency: {0}
    ContainerInconsistency(String),
    /// database error: {0}
    DbError(#[from] DbError),
    /// time error: {0}
    TimeError(#[from] TimeError),
    /// serialization error: {0}
    SerializeError(#[from] SerializeError),
}
