// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::error::ModelsError;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serac_serialization::{Deserializer, SerializeError, Serializer};
use std::str::FromStr;

/// Size in bytes of a compressed BLS public key
pub const BLS_PUBLIC_KEY_SIZE_BYTES: usize = 48;

const BLS_PUBLIC_KEY_PREFIX: char = 'P';

/// Compressed BLS public key attached to a validator record.
///
/// Carried as opaque bytes: key aggregation and signature verification
/// happen in the warp message verifier, not here. The key is owned
/// exclusively by the record that carries it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlsPublicKey([u8; BLS_PUBLIC_KEY_SIZE_BYTES]);

impl BlsPublicKey {
    /// Builds a `BlsPublicKey` from its compressed form
    pub const fn from_bytes(bytes: [u8; BLS_PUBLIC_KEY_SIZE_BYTES]) -> Self {
        BlsPublicKey(bytes)
    }

    /// Compressed key bytes
    pub const fn as_bytes(&self) -> &[u8; BLS_PUBLIC_KEY_SIZE_BYTES] {
        &self.0
    }
}

impl std::fmt::Display for BlsPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            BLS_PUBLIC_KEY_PREFIX,
            bs58::encode(self.0).with_check().into_string()
        )
    }
}

impl std::fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for BlsPublicKey {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match chars.next() {
            Some(prefix) if prefix == BLS_PUBLIC_KEY_PREFIX => {
                let decoded = bs58::decode(chars.as_str())
                    .with_check(None)
                    .into_vec()
                    .map_err(|_| ModelsError::InvalidIdString(s.to_string()))?;
                let bytes: [u8; BLS_PUBLIC_KEY_SIZE_BYTES] = decoded
                    .try_into()
                    .map_err(|_| ModelsError::InvalidIdLength(BLS_PUBLIC_KEY_SIZE_BYTES))?;
                Ok(BlsPublicKey(bytes))
            }
            _ => Err(ModelsError::InvalidIdString(s.to_string())),
        }
    }
}

impl ::serde::Serialize for BlsPublicKey {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_string())
        } else {
            s.serialize_bytes(&self.0)
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<BlsPublicKey, D::Error> {
        if d.is_human_readable() {
            struct BlsPublicKeyVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BlsPublicKeyVisitor {
                type Value = BlsPublicKey;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("P + base58::check encoded bytes")
                }

                fn visit_str<E: ::serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                    BlsPublicKey::from_str(v).map_err(E::custom)
                }
            }
            d.deserialize_str(BlsPublicKeyVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = BlsPublicKey;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("compressed BLS public key bytes")
                }

                fn visit_bytes<E: ::serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                    let bytes: [u8; BLS_PUBLIC_KEY_SIZE_BYTES] =
                        v.try_into().map_err(|_| E::invalid_length(v.len(), &self))?;
                    Ok(BlsPublicKey(bytes))
                }
            }
            d.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Serializer for `BlsPublicKey`
#[derive(Clone, Default)]
pub struct BlsPublicKeySerializer;

impl BlsPublicKeySerializer {
    /// Creates a `BlsPublicKeySerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<BlsPublicKey> for BlsPublicKeySerializer {
    fn serialize(&self, value: &BlsPublicKey, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.0);
        Ok(())
    }
}

/// Deserializer for `BlsPublicKey`
#[derive(Clone, Default)]
pub struct BlsPublicKeyDeserializer;

impl BlsPublicKeyDeserializer {
    /// Creates a `BlsPublicKeyDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<BlsPublicKey> for BlsPublicKeyDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BlsPublicKey, E> {
        context("Failed BlsPublicKey deserialization", |input: &'a [u8]| {
            let (rest, bytes) = take(BLS_PUBLIC_KEY_SIZE_BYTES)(input)?;
            Ok((rest, BlsPublicKey(bytes.try_into().unwrap()))) // cannot fail, take checks the length
        })(buffer)
    }
}
