// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::error::ModelsError;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serac_serialization::{Deserializer, SerializeError, Serializer};
use std::str::FromStr;

/// Size in bytes of a serialized `SubnetId`
pub const SUBNET_ID_SIZE_BYTES: usize = 32;

const SUBNET_ID_PREFIX: char = 'S';

/// Identifier of a subnet: an independently validated chain grouping.
///
/// The primary network is a distinguished subnet that every validator
/// implicitly joins; it is identified by [`SubnetId::PRIMARY_NETWORK`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubnetId([u8; SUBNET_ID_SIZE_BYTES]);

impl SubnetId {
    /// The distinguished primary network identifier
    pub const PRIMARY_NETWORK: SubnetId = SubnetId([0u8; SUBNET_ID_SIZE_BYTES]);

    /// Builds a `SubnetId` from raw identifier bytes
    pub const fn from_bytes(bytes: [u8; SUBNET_ID_SIZE_BYTES]) -> Self {
        SubnetId(bytes)
    }

    /// Raw identifier bytes
    pub const fn as_bytes(&self) -> &[u8; SUBNET_ID_SIZE_BYTES] {
        &self.0
    }

    /// Whether this is the primary network identifier
    pub fn is_primary_network(&self) -> bool {
        *self == Self::PRIMARY_NETWORK
    }
}

impl std::fmt::Display for SubnetId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            SUBNET_ID_PREFIX,
            bs58::encode(self.0).with_check().into_string()
        )
    }
}

impl std::fmt::Debug for SubnetId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for SubnetId {
    /// ## Example
    /// ```rust
    /// # use serac_models::subnet_id::SubnetId;
    /// # use std::str::FromStr;
    /// let subnet_id = SubnetId::from_bytes([42u8; 32]);
    /// let subnet_str = subnet_id.to_string();
    /// assert_eq!(subnet_id, SubnetId::from_str(&subnet_str).unwrap());
    /// ```
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match chars.next() {
            Some(prefix) if prefix == SUBNET_ID_PREFIX => {
                let decoded = bs58::decode(chars.as_str())
                    .with_check(None)
                    .into_vec()
                    .map_err(|_| ModelsError::InvalidIdString(s.to_string()))?;
                let bytes: [u8; SUBNET_ID_SIZE_BYTES] = decoded
                    .try_into()
                    .map_err(|_| ModelsError::InvalidIdLength(SUBNET_ID_SIZE_BYTES))?;
                Ok(SubnetId(bytes))
            }
            _ => Err(ModelsError::InvalidIdString(s.to_string())),
        }
    }
}

impl ::serde::Serialize for SubnetId {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_string())
        } else {
            s.serialize_bytes(&self.0)
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for SubnetId {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<SubnetId, D::Error> {
        if d.is_human_readable() {
            struct SubnetIdVisitor;

            impl<'de> ::serde::de::Visitor<'de> for SubnetIdVisitor {
                type Value = SubnetId;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("S + base58::check encoded bytes")
                }

                fn visit_str<E: ::serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                    SubnetId::from_str(v).map_err(E::custom)
                }
            }
            d.deserialize_str(SubnetIdVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = SubnetId;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("raw subnet identifier bytes")
                }

                fn visit_bytes<E: ::serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                    let bytes: [u8; SUBNET_ID_SIZE_BYTES] =
                        v.try_into().map_err(|_| E::invalid_length(v.len(), &self))?;
                    Ok(SubnetId(bytes))
                }
            }
            d.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Serializer for `SubnetId`
#[derive(Clone, Default)]
pub struct SubnetIdSerializer;

impl SubnetIdSerializer {
    /// Creates a `SubnetIdSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<SubnetId> for SubnetIdSerializer {
    fn serialize(&self, value: &SubnetId, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.0);
        Ok(())
    }
}

/// Deserializer for `SubnetId`
#[derive(Clone, Default)]
pub struct SubnetIdDeserializer;

impl SubnetIdDeserializer {
    /// Creates a `SubnetIdDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<SubnetId> for SubnetIdDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], SubnetId, E> {
        context("Failed SubnetId deserialization", |input: &'a [u8]| {
            let (rest, bytes) = take(SUBNET_ID_SIZE_BYTES)(input)?;
            Ok((rest, SubnetId(bytes.try_into().unwrap()))) // cannot fail, take checks the length
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serac_serialization::DeserializeError;

    #[test]
    fn test_string_roundtrip() {
        let subnet_id = SubnetId::from_bytes([7u8; SUBNET_ID_SIZE_BYTES]);
        assert_eq!(
            SubnetId::from_str(&subnet_id.to_string()).unwrap(),
            subnet_id
        );
        SubnetId::from_str("X11111").expect_err("bad prefix should fail");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let subnet_id = SubnetId::from_bytes([0xAB; SUBNET_ID_SIZE_BYTES]);
        let mut buffer = Vec::new();
        SubnetIdSerializer::new()
            .serialize(&subnet_id, &mut buffer)
            .unwrap();
        let (rest, result) = SubnetIdDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(result, subnet_id);
    }

    #[test]
    fn test_primary_network() {
        assert!(SubnetId::PRIMARY_NETWORK.is_primary_network());
        assert!(!SubnetId::from_bytes([1u8; SUBNET_ID_SIZE_BYTES]).is_primary_network());
    }
}
