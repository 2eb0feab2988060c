// Copyright (c) 2025 SERAC LABS <info@serac.network>
//! Binary serialization primitives shared by every crate of the node:
//! the `Serializer`/`Deserializer` traits, varint helpers and the
//! `Option` combinators built on top of them.

#![warn(missing_docs)]

use displaydoc::Display;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ErrorKind, ParseError, VerboseError, VerboseErrorKind};
use nom::IResult;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

/// Serialization error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Trait for serializers of a type `T` into an existing byte buffer
pub trait Serializer<T> {
    /// Appends the binary form of `value` to `buffer`
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Trait for deserializers of a type `T` from a byte slice
pub trait Deserializer<T> {
    /// Parses one `T` from the front of `buffer`, returning the rest
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Concrete error type to instantiate `Deserializer::deserialize` with when
/// the caller wants a displayable context chain
#[derive(Debug)]
pub struct DeserializeError<'a>(VerboseError<&'a [u8]>);

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self(VerboseError::from_error_kind(input, kind))
    }

    fn append(input: &'a [u8], kind: ErrorKind, other: Self) -> Self {
        Self(VerboseError::append(input, kind, other.0))
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, other: Self) -> Self {
        Self(VerboseError::add_context(input, ctx, other.0))
    }
}

impl<'a> fmt::Display for DeserializeError<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (input, error) in self.0.errors.iter().rev() {
            match error {
                VerboseErrorKind::Context(ctx) => write!(f, "{} / ", ctx)?,
                VerboseErrorKind::Char(c) => write!(f, "expected '{}' / ", c)?,
                VerboseErrorKind::Nom(kind) => {
                    write!(f, "{:?} with {} bytes of input left", kind, input.len())?
                }
            }
        }
        Ok(())
    }
}

/// Serializer for `u64` as an unsigned LEB128 varint
#[derive(Clone, Default)]
pub struct U64VarIntSerializer;

impl U64VarIntSerializer {
    /// Creates a new `U64VarIntSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u64> for U64VarIntSerializer {
    /// ```
    /// use serac_serialization::{Serializer, U64VarIntSerializer};
    ///
    /// let mut buffer = Vec::new();
    /// U64VarIntSerializer::new().serialize(&300u64, &mut buffer).unwrap();
    /// assert_eq!(buffer, vec![0b10101100, 0b00000010]);
    /// ```
    fn serialize(&self, value: &u64, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let mut temp = unsigned_varint::encode::u64_buffer();
        buffer.extend_from_slice(unsigned_varint::encode::u64(*value, &mut temp));
        Ok(())
    }
}

/// Deserializer for a range-checked `u64` unsigned LEB128 varint
#[derive(Clone)]
pub struct U64VarIntDeserializer {
    range: (Bound<u64>, Bound<u64>),
}

impl U64VarIntDeserializer {
    /// Creates a new `U64VarIntDeserializer`, rejecting values outside of the
    /// given bounds
    pub const fn new(min: Bound<u64>, max: Bound<u64>) -> Self {
        Self { range: (min, max) }
    }
}

impl Deserializer<u64> for U64VarIntDeserializer {
    /// ```
    /// use std::ops::Bound::Included;
    /// use serac_serialization::{DeserializeError, Deserializer, U64VarIntDeserializer};
    ///
    /// let deserializer = U64VarIntDeserializer::new(Included(u64::MIN), Included(u64::MAX));
    /// let (rest, value) = deserializer
    ///     .deserialize::<DeserializeError>(&[0b10101100, 0b00000010, 7])
    ///     .unwrap();
    /// assert_eq!(value, 300);
    /// assert_eq!(rest, &[7]);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u64, E> {
        context("Failed u64 varint deserialization", |input: &'a [u8]| {
            let (value, rest) = unsigned_varint::decode::u64(input)
                .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Eof)))?;
            if !self.range.contains(&value) {
                return Err(nom::Err::Error(E::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            Ok((rest, value))
        })(buffer)
    }
}

const OPTION_NONE_TAG: u8 = 0u8;
const OPTION_SOME_TAG: u8 = 1u8;

/// Serializer for `Option<T>`, one tag byte followed by the inner value
pub struct OptionSerializer<T, ST>
where
    ST: Serializer<T>,
{
    data_serializer: ST,
    phantom_t: PhantomData<T>,
}

impl<T, ST: Serializer<T>> OptionSerializer<T, ST> {
    /// Creates a new `OptionSerializer` from the serializer of the inner type
    pub fn new(data_serializer: ST) -> Self {
        Self {
            data_serializer,
            phantom_t: PhantomData,
        }
    }
}

impl<T, ST: Serializer<T>> Serializer<Option<T>> for OptionSerializer<T, ST> {
    fn serialize(&self, value: &Option<T>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        match value {
            Some(data) => {
                buffer.push(OPTION_SOME_TAG);
                self.data_serializer.serialize(data, buffer)
            }
            None => {
                buffer.push(OPTION_NONE_TAG);
                Ok(())
            }
        }
    }
}

/// Deserializer for `Option<T>`, one tag byte followed by the inner value
pub struct OptionDeserializer<T, DT>
where
    DT: Deserializer<T>,
{
    data_deserializer: DT,
    phantom_t: PhantomData<T>,
}

impl<T, DT: Deserializer<T>> OptionDeserializer<T, DT> {
    /// Creates a new `OptionDeserializer` from the deserializer of the inner
    /// type
    pub fn new(data_deserializer: DT) -> Self {
        Self {
            data_deserializer,
            phantom_t: PhantomData,
        }
    }
}

impl<T, DT: Deserializer<T>> Deserializer<Option<T>> for OptionDeserializer<T, DT> {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Option<T>, E> {
        context("Failed Option deserialization", |input: &'a [u8]| {
            let (rest, tag) = take(1usize)(input)?;
            match tag[0] {
                OPTION_NONE_TAG => Ok((rest, None)),
                OPTION_SOME_TAG => self
                    .data_deserializer
                    .deserialize(rest)
                    .map(|(rest, data)| (rest, Some(data))),
                _ => Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Tag))),
            }
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Bound::{Excluded, Included};

    #[test]
    fn test_u64_varint_roundtrip() {
        let serializer = U64VarIntSerializer::new();
        let deserializer = U64VarIntDeserializer::new(Included(u64::MIN), Included(u64::MAX));
        for value in [0u64, 1, 127, 128, 300, u64::from(u32::MAX), u64::MAX] {
            let mut buffer = Vec::new();
            serializer.serialize(&value, &mut buffer).unwrap();
            let (rest, result) = deserializer
                .deserialize::<DeserializeError>(&buffer)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(result, value);
        }
    }

    #[test]
    fn test_u64_varint_bounds() {
        let serializer = U64VarIntSerializer::new();
        let deserializer = U64VarIntDeserializer::new(Included(0), Excluded(100));
        let mut buffer = Vec::new();
        serializer.serialize(&100u64, &mut buffer).unwrap();
        deserializer
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("value out of bounds should fail");
    }

    #[test]
    fn test_u64_varint_empty_input() {
        let deserializer = U64VarIntDeserializer::new(Included(u64::MIN), Included(u64::MAX));
        deserializer
            .deserialize::<DeserializeError>(&[])
            .expect_err("empty input should fail");
    }

    #[test]
    fn test_option_roundtrip() {
        let serializer = OptionSerializer::new(U64VarIntSerializer::new());
        let deserializer = OptionDeserializer::new(U64VarIntDeserializer::new(
            Included(u64::MIN),
            Included(u64::MAX),
        ));
        for value in [None, Some(0u64), Some(42), Some(u64::MAX)] {
            let mut buffer = Vec::new();
            serializer.serialize(&value, &mut buffer).unwrap();
            let (rest, result) = deserializer
                .deserialize::<DeserializeError>(&buffer)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(result, value);
        }
    }

    #[test]
    fn test_option_bad_tag() {
        let deserializer = OptionDeserializer::new(U64VarIntDeserializer::new(
            Included(u64::MIN),
            Included(u64::MAX),
        ));
        deserializer
            .deserialize::<DeserializeError>(&[2u8, 42])
            .expect_err("unknown option tag should fail");
    }
}
