// Copyright (c) 2025 SERAC LABS <info@serac.network>
//! Unsigned time management
#![warn(missing_docs)]

mod error;
pub use error::TimeError;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serac_serialization::{Deserializer, Serializer, U64VarIntDeserializer, U64VarIntSerializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{
    convert::{TryFrom, TryInto},
    str::FromStr,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Time structure used everywhere.
/// milliseconds since 01/01/1970.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeracTime(u64);

/// Serializer for `SeracTime`
#[derive(Default)]
pub struct SeracTimeSerializer {
    u64_serializer: U64VarIntSerializer,
}

impl SeracTimeSerializer {
    /// Creates a `SeracTimeSerializer`
    pub fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<SeracTime> for SeracTimeSerializer {
    /// ```
    /// use serac_serialization::Serializer;
    /// use serac_time::{SeracTime, SeracTimeSerializer};
    ///
    /// let time: SeracTime = SeracTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// SeracTimeSerializer::new().serialize(&time, &mut serialized).unwrap();
    /// ```
    fn serialize(
        &self,
        value: &SeracTime,
        buffer: &mut Vec<u8>,
    ) -> Result<(), serac_serialization::SerializeError> {
        self.u64_serializer.serialize(&value.to_millis(), buffer)
    }
}

/// Deserializer for `SeracTime`
pub struct SeracTimeDeserializer {
    u64_deserializer: U64VarIntDeserializer,
}

impl SeracTimeDeserializer {
    /// Creates a `SeracTimeDeserializer`
    ///
    /// Arguments:
    /// * range: bounds for the time values to accept
    pub fn new(range: (Bound<SeracTime>, Bound<SeracTime>)) -> Self {
        fn to_millis_bound(bound: Bound<SeracTime>) -> Bound<u64> {
            match bound {
                Bound::Included(time) => Bound::Included(time.to_millis()),
                Bound::Excluded(time) => Bound::Excluded(time.to_millis()),
                Bound::Unbounded => Bound::Unbounded,
            }
        }
        Self {
            u64_deserializer: U64VarIntDeserializer::new(
                to_millis_bound(range.0),
                to_millis_bound(range.1),
            ),
        }
    }
}

impl Deserializer<SeracTime> for SeracTimeDeserializer {
    /// ```
    /// use std::ops::Bound::Included;
    /// use serac_serialization::{Serializer, Deserializer, DeserializeError};
    /// use serac_time::{SeracTime, SeracTimeSerializer, SeracTimeDeserializer};
    ///
    /// let time: SeracTime = SeracTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// let serializer = SeracTimeSerializer::new();
    /// let deserializer = SeracTimeDeserializer::new((Included(SeracTime::from_millis(0)), Included(SeracTime::from_millis(u64::MAX))));
    /// serializer.serialize(&time, &mut serialized).unwrap();
    /// let (rest, time_deser) = deserializer.deserialize::<DeserializeError>(&serialized).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(time, time_deser);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], SeracTime, E> {
        context("Failed SeracTime deserialization", |input| {
            self.u64_deserializer
                .deserialize(input)
                .map(|(rest, res)| (rest, SeracTime::from_millis(res)))
        })(buffer)
    }
}

impl fmt::Display for SeracTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis())
    }
}

impl TryFrom<Duration> for SeracTime {
    type Error = TimeError;

    /// Conversion from `std::time::Duration`.
    /// ```
    /// # use std::time::Duration;
    /// # use serac_time::*;
    /// # use std::convert::TryFrom;
    /// let duration: Duration = Duration::from_millis(42);
    /// let time: SeracTime = SeracTime::from_millis(42);
    /// assert_eq!(time, SeracTime::try_from(duration).unwrap());
    /// ```
    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Ok(SeracTime(
            value
                .as_millis()
                .try_into()
                .map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl From<SeracTime> for Duration {
    fn from(value: SeracTime) -> Self {
        value.to_duration()
    }
}

impl FromStr for SeracTime {
    type Err = crate::TimeError;

    /// Conversion from `&str`.
    ///
    /// ```
    /// # use serac_time::*;
    /// # use std::str::FromStr;
    /// let millis: &str = "42";
    /// let time: SeracTime = SeracTime::from_millis(42);
    ///
    /// assert_eq!(time, SeracTime::from_str(millis).unwrap());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SeracTime(
            u64::from_str(s).map_err(|_| Self::Err::ConversionError)?,
        ))
    }
}

impl SeracTime {
    /// Smallest time interval
    pub const EPSILON: SeracTime = SeracTime(1);

    /// Conversion from `u64`, representing a timestamp in milliseconds.
    /// ```
    /// # use serac_time::*;
    /// let time: SeracTime = SeracTime::from_millis(42);
    /// ```
    pub const fn from_millis(value: u64) -> Self {
        SeracTime(value)
    }

    /// Gets the current UNIX timestamp (resolution: milliseconds).
    pub fn now() -> Result<Self, TimeError> {
        let now: u64 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeError::TimeOverflowError)?
            .as_millis()
            .try_into()
            .map_err(|_| TimeError::TimeOverflowError)?;
        Ok(SeracTime(now))
    }

    /// Conversion to `std::time::Duration`.
    /// ```
    /// # use std::time::Duration;
    /// # use serac_time::*;
    /// let duration: Duration = Duration::from_millis(42);
    /// let time: SeracTime = SeracTime::from_millis(42);
    /// assert_eq!(time.to_duration(), duration);
    /// ```
    pub fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Conversion to `u64`, representing milliseconds.
    /// ```
    /// # use serac_time::*;
    /// let time: SeracTime = SeracTime::from_millis(42);
    /// assert_eq!(time.to_millis(), 42);
    /// ```
    pub const fn to_millis(&self) -> u64 {
        self.0
    }

    /// ```
    /// # use serac_time::*;
    /// let time_1: SeracTime = SeracTime::from_millis(42);
    /// let time_2: SeracTime = SeracTime::from_millis(7);
    /// assert_eq!(time_1.saturating_sub(time_2), SeracTime::from_millis(35));
    /// ```
    #[must_use]
    pub fn saturating_sub(self, t: SeracTime) -> Self {
        SeracTime(self.0.saturating_sub(t.0))
    }

    /// ```
    /// # use serac_time::*;
    /// let time_1: SeracTime = SeracTime::from_millis(42);
    /// let time_2: SeracTime = SeracTime::from_millis(7);
    /// assert_eq!(time_1.saturating_add(time_2), SeracTime::from_millis(49));
    /// ```
    #[must_use]
    pub fn saturating_add(self, t: SeracTime) -> Self {
        SeracTime(self.0.saturating_add(t.0))
    }

    /// ```
    /// # use serac_time::*;
    /// let time_1: SeracTime = SeracTime::from_millis(42);
    /// let time_2: SeracTime = SeracTime::from_millis(7);
    /// assert_eq!(time_1.checked_sub(time_2).unwrap(), SeracTime::from_millis(35));
    /// ```
    pub fn checked_sub(self, t: SeracTime) -> Result<Self, TimeError> {
        self.0
            .checked_sub(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("subtraction error".to_string()))
            .map(SeracTime)
    }

    /// ```
    /// # use serac_time::*;
    /// let time_1: SeracTime = SeracTime::from_millis(42);
    /// let time_2: SeracTime = SeracTime::from_millis(7);
    /// assert_eq!(time_1.checked_add(time_2).unwrap(), SeracTime::from_millis(49));
    /// ```
    pub fn checked_add(self, t: SeracTime) -> Result<Self, TimeError> {
        self.0
            .checked_add(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("addition error".to_string()))
            .map(SeracTime)
    }

    /// ```
    /// # use serac_time::*;
    /// let time: SeracTime = SeracTime::from_millis(42);
    /// assert_eq!(time.checked_mul(10).unwrap(), SeracTime::from_millis(420));
    /// ```
    pub fn checked_mul(self, factor: u64) -> Result<Self, TimeError> {
        self.0
            .checked_mul(factor)
            .ok_or_else(|| TimeError::CheckedOperationError("multiplication error".to_string()))
            .map(SeracTime)
    }

    /// ```
    /// # use serac_time::*;
    /// let time: SeracTime = SeracTime::from_millis(42);
    /// assert_eq!(time.saturating_mul(10), SeracTime::from_millis(420));
    /// ```
    #[must_use]
    pub fn saturating_mul(self, factor: u64) -> Self {
        SeracTime(self.0.saturating_mul(factor))
    }

    /// RFC 3339 rendering, for logs and user-facing output.
    /// ```
    /// # use serac_time::*;
    /// let time: SeracTime = SeracTime::from_millis(0);
    /// assert_eq!(time.to_utc_string(), "1970-01-01T00:00:00Z");
    /// ```
    pub fn to_utc_string(&self) -> String {
        OffsetDateTime::from_unix_timestamp_nanos((self.0 as i128) * 1_000_000)
            .ok()
            .and_then(|date_time| date_time.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.to_string())
    }
}
