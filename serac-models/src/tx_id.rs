// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::error::ModelsError;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serac_serialization::{Deserializer, SerializeError, Serializer};
use std::str::FromStr;

/// Size in bytes of a serialized `TxId`
pub const TX_ID_SIZE_BYTES: usize = 32;

const TX_ID_PREFIX: char = 'T';

/// Identifier of the transaction that created or last modified a staker.
///
/// Byte-wise lexicographic comparison of `TxId`s is the final ordering
/// tie-break for stakers, so the derived `Ord` must stay the plain
/// byte-array ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId([u8; TX_ID_SIZE_BYTES]);

impl TxId {
    /// Builds a `TxId` from raw identifier bytes
    pub const fn from_bytes(bytes: [u8; TX_ID_SIZE_BYTES]) -> Self {
        TxId(bytes)
    }

    /// Raw identifier bytes
    pub const fn as_bytes(&self) -> &[u8; TX_ID_SIZE_BYTES] {
        &self.0
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            TX_ID_PREFIX,
            bs58::encode(self.0).with_check().into_string()
        )
    }
}

impl std::fmt::Debug for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for TxId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match chars.next() {
            Some(prefix) if prefix == TX_ID_PREFIX => {
                let decoded = bs58::decode(chars.as_str())
                    .with_check(None)
                    .into_vec()
                    .map_err(|_| ModelsError::InvalidIdString(s.to_string()))?;
                let bytes: [u8; TX_ID_SIZE_BYTES] = decoded
                    .try_into()
                    .map_err(|_| ModelsError::InvalidIdLength(TX_ID_SIZE_BYTES))?;
                Ok(TxId(bytes))
            }
            _ => Err(ModelsError::InvalidIdString(s.to_string())),
        }
    }
}

impl ::serde::Serialize for TxId {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_string())
        } else {
            s.serialize_bytes(&self.0)
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for TxId {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<TxId, D::Error> {
        if d.is_human_readable() {
            struct TxIdVisitor;

            impl<'de> ::serde::de::Visitor<'de> for TxIdVisitor {
                type Value = TxId;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("T + base58::check encoded bytes")
                }

                fn visit_str<E: ::serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                    TxId::from_str(v).map_err(E::custom)
                }
            }
            d.deserialize_str(TxIdVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = TxId;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("raw transaction identifier bytes")
                }

                fn visit_bytes<E: ::serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                    let bytes: [u8; TX_ID_SIZE_BYTES] =
                        v.try_into().map_err(|_| E::invalid_length(v.len(), &self))?;
                    Ok(TxId(bytes))
                }
            }
            d.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Serializer for `TxId`
#[derive(Clone, Default)]
pub struct TxIdSerializer;

impl TxIdSerializer {
    /// Creates a `TxIdSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<TxId> for TxIdSerializer {
    fn serialize(&self, value: &TxId, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.0);
        Ok(())
    }
}

/// Deserializer for `TxId`
#[derive(Clone, Default)]
pub struct TxIdDeserializer;

impl TxIdDeserializer {
    /// Creates a `TxIdDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<TxId> for TxIdDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], TxId, E> {
        context("Failed TxId deserialization", |input: &'a [u8]| {
            let (rest, bytes) = take(TX_ID_SIZE_BYTES)(input)?;
            Ok((rest, TxId(bytes.try_into().unwrap()))) // cannot fail, take checks the length
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_roundtrip() {
        let tx_id = TxId::from_bytes([99u8; TX_ID_SIZE_BYTES]);
        assert_eq!(TxId::from_str(&tx_id.to_string()).unwrap(), tx_id);
    }

    #[test]
    fn test_byte_ordering() {
        let mut low = [0u8; TX_ID_SIZE_BYTES];
        let mut high = [0u8; TX_ID_SIZE_BYTES];
        low[0] = 1;
        high[0] = 2;
        assert!(TxId::from_bytes(low) < TxId::from_bytes(high));
    }
}
