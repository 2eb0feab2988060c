// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::{
    DynStakerIterator, DynWeightIterator, Staker, StakerSetChanges, StakersResult, WeightDiff,
};
use serac_db_exports::DBBatch;
use serac_models::node_id::NodeId;
use serac_models::subnet_id::SubnetId;

/// Interface of the staker ledger, consumed by the block executor and the
/// consensus engine.
///
/// All mutations are staged into the caller-supplied batches and become
/// durable only when the caller writes them, so every diff of a height
/// commits atomically with the staker set mutations of that height.
pub trait StakersController: Send + Sync {
    /// Adds a staker to the live set and stages its persisted record; a
    /// staker entering the current set also stages a weight-increase diff
    /// at `height`.
    fn insert_staker(
        &mut self,
        staker: Staker,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()>;

    /// Removes a staker from the live set; a staker leaving the current
    /// set also stages a weight-decrease diff at `height`.
    fn remove_staker(
        &mut self,
        staker: &Staker,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()>;

    /// Adjusts the weight of the current validator of `node_id` on
    /// `subnet_id`, staging the diff at `height`. Returns the net diff
    /// staged for that coordinate.
    #[allow(clippy::too_many_arguments)]
    fn update_weight(
        &mut self,
        subnet_id: &SubnetId,
        node_id: &NodeId,
        height: u64,
        decrease: bool,
        amount: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<WeightDiff>;

    /// Applies a whole block's accumulated changes at `height`
    fn apply_changes_to_batch(
        &mut self,
        changes: StakerSetChanges,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()>;

    /// Reconstructs the validator set of `subnet_id` as it was at `height`
    fn stakers_at(&self, subnet_id: &SubnetId, height: u64) -> StakersResult<DynWeightIterator>;

    /// Iterates the current set of `subnet_id` in sort-key order
    fn current_set_iterator(&self, subnet_id: &SubnetId) -> DynStakerIterator<'_>;

    /// Iterates the pending set of `subnet_id` in sort-key order
    fn pending_set_iterator(&self, subnet_id: &SubnetId) -> DynStakerIterator<'_>;
}
