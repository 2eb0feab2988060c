// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::error::ModelsError;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serac_serialization::{Deserializer, SerializeError, Serializer};
use std::str::FromStr;

/// Size in bytes of a serialized `NodeId`
pub const NODE_ID_SIZE_BYTES: usize = 20;

const NODE_ID_PREFIX: char = 'N';

/// `NodeId` uniquely identifies a validating node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId([u8; NODE_ID_SIZE_BYTES]);

impl NodeId {
    /// Builds a `NodeId` from raw identifier bytes
    pub const fn from_bytes(bytes: [u8; NODE_ID_SIZE_BYTES]) -> Self {
        NodeId(bytes)
    }

    /// Raw identifier bytes
    pub const fn as_bytes(&self) -> &[u8; NODE_ID_SIZE_BYTES] {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            NODE_ID_PREFIX,
            bs58::encode(self.0).with_check().into_string()
        )
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for NodeId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match chars.next() {
            Some(prefix) if prefix == NODE_ID_PREFIX => {
                let decoded = bs58::decode(chars.as_str())
                    .with_check(None)
                    .into_vec()
                    .map_err(|_| ModelsError::InvalidIdString(s.to_string()))?;
                let bytes: [u8; NODE_ID_SIZE_BYTES] = decoded
                    .try_into()
                    .map_err(|_| ModelsError::InvalidIdLength(NODE_ID_SIZE_BYTES))?;
                Ok(NodeId(bytes))
            }
            _ => Err(ModelsError::InvalidIdString(s.to_string())),
        }
    }
}

impl ::serde::Serialize for NodeId {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_string())
        } else {
            s.serialize_bytes(&self.0)
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for NodeId {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<NodeId, D::Error> {
        if d.is_human_readable() {
            struct NodeIdVisitor;

            impl<'de> ::serde::de::Visitor<'de> for NodeIdVisitor {
                type Value = NodeId;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("N + base58::check encoded bytes")
                }

                fn visit_str<E: ::serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                    NodeId::from_str(v).map_err(E::custom)
                }
            }
            d.deserialize_str(NodeIdVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = NodeId;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("raw node identifier bytes")
                }

                fn visit_bytes<E: ::serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                    let bytes: [u8; NODE_ID_SIZE_BYTES] =
                        v.try_into().map_err(|_| E::invalid_length(v.len(), &self))?;
                    Ok(NodeId(bytes))
                }
            }
            d.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Serializer for `NodeId`
#[derive(Clone, Default)]
pub struct NodeIdSerializer;

impl NodeIdSerializer {
    /// Creates a `NodeIdSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<NodeId> for NodeIdSerializer {
    fn serialize(&self, value: &NodeId, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.0);
        Ok(())
    }
}

/// Deserializer for `NodeId`
#[derive(Clone, Default)]
pub struct NodeIdDeserializer;

impl NodeIdDeserializer {
    /// Creates a `NodeIdDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<NodeId> for NodeIdDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], NodeId, E> {
        context("Failed NodeId deserialization", |input: &'a [u8]| {
            let (rest, bytes) = take(NODE_ID_SIZE_BYTES)(input)?;
            Ok((rest, NodeId(bytes.try_into().unwrap()))) // cannot fail, take checks the length
        })(buffer)
    }
}
