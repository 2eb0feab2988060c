// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::{Staker, StakersResult, WeightDiff};
use serac_models::node_id::NodeId;
use serac_models::subnet_id::SubnetId;
use std::collections::BTreeMap;

/// Staker set changes accumulated while executing one block.
///
/// The executor fills this during execution and applies it in one batch at
/// block acceptance, so all the diffs of a height become durable together
/// with the staker set mutations that produced them.
#[derive(Debug, Clone, Default)]
pub struct StakerSetChanges {
    /// stakers entering the set
    pub added: Vec<Staker>,
    /// stakers leaving the set
    pub removed: Vec<Staker>,
    /// net weight adjustments for stakers staying in the set
    pub weight_changes: BTreeMap<(SubnetId, NodeId), WeightDiff>,
}

impl StakerSetChanges {
    /// Folds one weight change into the accumulated net change for the
    /// node. Changes netting out to zero are dropped.
    pub fn record_weight_change(
        &mut self,
        subnet_id: SubnetId,
        node_id: NodeId,
        decrease: bool,
        amount: u64,
    ) -> StakersResult<()> {
        let entry = self
            .weight_changes
            .entry((subnet_id, node_id))
            .or_default();
        entry.merge(decrease, amount)?;
        if entry.is_zero() {
            self.weight_changes.remove(&(subnet_id, node_id));
        }
        Ok(())
    }

    /// Whether there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.weight_changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serac_models::node_id::NODE_ID_SIZE_BYTES;

    #[test]
    fn test_record_weight_change_accumulates() {
        let node = NodeId::from_bytes([1u8; NODE_ID_SIZE_BYTES]);
        let mut changes = StakerSetChanges::default();
        assert!(changes.is_empty());

        changes
            .record_weight_change(SubnetId::PRIMARY_NETWORK, node, false, 50)
            .unwrap();
        changes
            .record_weight_change(SubnetId::PRIMARY_NETWORK, node, true, 20)
            .unwrap();
        assert_eq!(
            changes.weight_changes[&(SubnetId::PRIMARY_NETWORK, node)],
            WeightDiff::new(false, 30)
        );

        // a change netting out to zero disappears
        changes
            .record_weight_change(SubnetId::PRIMARY_NETWORK, node, true, 30)
            .unwrap();
        assert!(changes.is_empty());
    }
}
