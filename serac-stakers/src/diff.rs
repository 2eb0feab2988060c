// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::{StakersError, StakersResult};
use serac_models::node_id::{NodeId, NODE_ID_SIZE_BYTES};
use serac_models::subnet_id::{SubnetId, SUBNET_ID_SIZE_BYTES};

// startDiffKey = [subnetId] + [inverseHeight]
/// Length of a serialized start key
pub const START_DIFF_KEY_LENGTH: usize = SUBNET_ID_SIZE_BYTES + HEIGHT_SIZE_BYTES;
/// Length of a serialized full diff key
pub const DIFF_KEY_LENGTH: usize = START_DIFF_KEY_LENGTH + NODE_ID_SIZE_BYTES;
// weightValue = [isDecrease] + [amount]
/// Length of a serialized weight diff value
pub const WEIGHT_DIFF_VALUE_LENGTH: usize = BOOL_SIZE_BYTES + AMOUNT_SIZE_BYTES;

const HEIGHT_SIZE_BYTES: usize = 8;
const BOOL_SIZE_BYTES: usize = 1;
const AMOUNT_SIZE_BYTES: usize = 8;

const INCREASE_BYTE: u8 = 0x00;
const DECREASE_BYTE: u8 = 0x01;

/// A delta of one staker's weight, observed at one
/// `(subnet, height, node)` coordinate.
///
/// Persisted diffs are an undo log relative to the present: walking them in
/// decreasing height order and inverting each one reconstructs the weights
/// at any past height. Zero deltas are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeightDiff {
    /// true if the weight decreased
    pub decrease: bool,
    /// magnitude of the change
    pub amount: u64,
}

impl WeightDiff {
    /// Creates a new `WeightDiff`
    pub fn new(decrease: bool, amount: u64) -> Self {
        Self { decrease, amount }
    }

    /// Folds another change at the same coordinate into this diff
    pub fn merge(&mut self, decrease: bool, amount: u64) -> StakersResult<()> {
        if self.decrease == decrease {
            self.amount = self.amount.checked_add(amount).ok_or_else(|| {
                StakersError::OverflowError("weight diff amount overflow".to_string())
            })?;
        } else if self.amount >= amount {
            self.amount -= amount;
        } else {
            self.decrease = decrease;
            self.amount = amount - self.amount;
        }
        Ok(())
    }

    /// Whether the diff nets out to no change
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Applies the diff to a weight, forward in time
    pub fn apply_to(&self, weight: u64) -> StakersResult<u64> {
        if self.decrease {
            weight.checked_sub(self.amount).ok_or_else(|| {
                StakersError::OverflowError("weight underflow when applying diff".to_string())
            })
        } else {
            weight.checked_add(self.amount).ok_or_else(|| {
                StakersError::OverflowError("weight overflow when applying diff".to_string())
            })
        }
    }

    /// Un-applies the diff, walking backward in time.
    ///
    /// Callers must invert diffs in strictly decreasing height order and
    /// stop exactly at the target height.
    pub fn invert_on(&self, weight: u64) -> StakersResult<u64> {
        if self.decrease {
            weight.checked_add(self.amount).ok_or_else(|| {
                StakersError::OverflowError("weight overflow when inverting diff".to_string())
            })
        } else {
            weight.checked_sub(self.amount).ok_or_else(|| {
                StakersError::OverflowError("weight underflow when inverting diff".to_string())
            })
        }
    }
}

/// Builds the key to start iterating the diffs of `subnet_id` from `height`
/// downward.
///
/// Invariant: the result is a strict byte prefix of [`marshal_diff_key`]
/// called with the same arguments.
pub fn marshal_start_diff_key(subnet_id: &SubnetId, height: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(START_DIFF_KEY_LENGTH);
    key.extend_from_slice(subnet_id.as_bytes());
    pack_iterable_height(&mut key, height);
    key
}

/// Builds the full key of one persisted weight diff
pub fn marshal_diff_key(subnet_id: &SubnetId, height: u64, node_id: &NodeId) -> Vec<u8> {
    let mut key = Vec::with_capacity(DIFF_KEY_LENGTH);
    key.extend_from_slice(subnet_id.as_bytes());
    pack_iterable_height(&mut key, height);
    key.extend_from_slice(node_id.as_bytes());
    key
}

/// Decodes a persisted diff key back into its
/// `(subnet_id, height, node_id)` coordinate
pub fn unmarshal_diff_key(key: &[u8]) -> StakersResult<(SubnetId, u64, NodeId)> {
    if key.len() != DIFF_KEY_LENGTH {
        return Err(StakersError::MalformedKey(format!(
            "expected diff key length {}, got {}",
            DIFF_KEY_LENGTH,
            key.len()
        )));
    }
    let subnet_id = SubnetId::from_bytes(
        key[..SUBNET_ID_SIZE_BYTES].try_into().unwrap(), // cannot fail, length checked above
    );
    let height = unpack_iterable_height(
        key[SUBNET_ID_SIZE_BYTES..START_DIFF_KEY_LENGTH]
            .try_into()
            .unwrap(), // cannot fail, length checked above
    );
    let node_id = NodeId::from_bytes(
        key[START_DIFF_KEY_LENGTH..].try_into().unwrap(), // cannot fail, length checked above
    );
    Ok((subnet_id, height, node_id))
}

/// Encodes a weight diff value
pub fn marshal_weight_diff(diff: &WeightDiff) -> Vec<u8> {
    let mut value = Vec::with_capacity(WEIGHT_DIFF_VALUE_LENGTH);
    value.push(if diff.decrease {
        DECREASE_BYTE
    } else {
        INCREASE_BYTE
    });
    value.extend_from_slice(&diff.amount.to_be_bytes());
    value
}

/// Decodes a weight diff value
pub fn unmarshal_weight_diff(value: &[u8]) -> StakersResult<WeightDiff> {
    if value.len() != WEIGHT_DIFF_VALUE_LENGTH {
        return Err(StakersError::MalformedValue(format!(
            "expected weight diff value length {}, got {}",
            WEIGHT_DIFF_VALUE_LENGTH,
            value.len()
        )));
    }
    let decrease = match value[0] {
        INCREASE_BYTE => false,
        DECREASE_BYTE => true,
        byte => {
            return Err(StakersError::MalformedValue(format!(
                "unexpected weight diff flag byte {:#04x}",
                byte
            )))
        }
    };
    let amount = u64::from_be_bytes(
        value[BOOL_SIZE_BYTES..].try_into().unwrap(), // cannot fail, length checked above
    );
    Ok(WeightDiff { decrease, amount })
}

// The height is bit-flipped before its big-endian encoding so that
// lexicographically ascending keys walk heights in descending order.
fn pack_iterable_height(key: &mut Vec<u8>, height: u64) {
    key.extend_from_slice(&(!height).to_be_bytes());
}

// The height was bit-flipped when the key was built, flip it back.
fn unpack_iterable_height(bytes: [u8; HEIGHT_SIZE_BYTES]) -> u64 {
    !u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet(byte: u8) -> SubnetId {
        SubnetId::from_bytes([byte; SUBNET_ID_SIZE_BYTES])
    }

    fn node(byte: u8) -> NodeId {
        NodeId::from_bytes([byte; NODE_ID_SIZE_BYTES])
    }

    #[test]
    fn test_diff_key_roundtrip() {
        for height in [0u64, 1, 42, u64::MAX] {
            let key = marshal_diff_key(&subnet(7), height, &node(3));
            assert_eq!(key.len(), DIFF_KEY_LENGTH);
            let (subnet_id, decoded_height, node_id) = unmarshal_diff_key(&key).unwrap();
            assert_eq!(subnet_id, subnet(7));
            assert_eq!(decoded_height, height);
            assert_eq!(node_id, node(3));
        }
    }

    #[test]
    fn test_start_key_is_a_strict_prefix() {
        let start = marshal_start_diff_key(&subnet(7), 42);
        let full = marshal_diff_key(&subnet(7), 42, &node(3));
        assert_eq!(start.len(), START_DIFF_KEY_LENGTH);
        assert!(full.starts_with(&start));
        assert!(full.len() > start.len());
    }

    #[test]
    fn test_height_ordering_is_descending() {
        // lower heights must encode to lexicographically greater keys
        let heights = [0u64, 1, 2, 41, 42, 1_000_000, u64::MAX - 1, u64::MAX];
        for window in heights.windows(2) {
            let (h1, h2) = (window[0], window[1]);
            let key1 = marshal_diff_key(&subnet(7), h1, &node(3));
            let key2 = marshal_diff_key(&subnet(7), h2, &node(3));
            assert!(key1 > key2, "key({}) must sort after key({})", h1, h2);
        }
    }

    #[test]
    fn test_malformed_key_is_rejected() {
        let key = marshal_diff_key(&subnet(7), 42, &node(3));
        let short = &key[..DIFF_KEY_LENGTH - 1];
        assert!(matches!(
            unmarshal_diff_key(short),
            Err(StakersError::MalformedKey(_))
        ));
        assert!(matches!(
            unmarshal_diff_key(&[]),
            Err(StakersError::MalformedKey(_))
        ));
        let mut long = key.clone();
        long.push(0);
        assert!(matches!(
            unmarshal_diff_key(&long),
            Err(StakersError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_weight_diff_roundtrip() {
        for diff in [
            WeightDiff::new(false, 0),
            WeightDiff::new(false, 50),
            WeightDiff::new(true, 20),
            WeightDiff::new(true, u64::MAX),
        ] {
            let value = marshal_weight_diff(&diff);
            assert_eq!(value.len(), WEIGHT_DIFF_VALUE_LENGTH);
            assert_eq!(unmarshal_weight_diff(&value).unwrap(), diff);
        }
    }

    #[test]
    fn test_malformed_value_is_rejected() {
        let value = marshal_weight_diff(&WeightDiff::new(true, 20));
        assert!(matches!(
            unmarshal_weight_diff(&value[..WEIGHT_DIFF_VALUE_LENGTH - 1]),
            Err(StakersError::MalformedValue(_))
        ));
        let mut bad_flag = value.clone();
        bad_flag[0] = 0x02;
        assert!(matches!(
            unmarshal_weight_diff(&bad_flag),
            Err(StakersError::MalformedValue(_))
        ));
    }

    #[test]
    fn test_merge() {
        let mut diff = WeightDiff::new(false, 30);
        diff.merge(false, 20).unwrap();
        assert_eq!(diff, WeightDiff::new(false, 50));

        // opposite signs cancel out
        diff.merge(true, 20).unwrap();
        assert_eq!(diff, WeightDiff::new(false, 30));

        // and flip the direction when they overshoot
        diff.merge(true, 50).unwrap();
        assert_eq!(diff, WeightDiff::new(true, 20));

        diff.merge(false, 20).unwrap();
        assert!(diff.is_zero());

        let mut overflowing = WeightDiff::new(false, u64::MAX);
        assert!(matches!(
            overflowing.merge(false, 1),
            Err(StakersError::OverflowError(_))
        ));
    }

    #[test]
    fn test_apply_and_invert() {
        let increase = WeightDiff::new(false, 50);
        let decrease = WeightDiff::new(true, 20);

        assert_eq!(increase.apply_to(100).unwrap(), 150);
        assert_eq!(decrease.apply_to(100).unwrap(), 80);
        assert_eq!(increase.invert_on(150).unwrap(), 100);
        assert_eq!(decrease.invert_on(80).unwrap(), 100);

        assert!(matches!(
            decrease.apply_to(10),
            Err(StakersError::OverflowError(_))
        ));
        assert!(matches!(
            increase.invert_on(10),
            Err(StakersError::OverflowError(_))
        ));
    }
}
