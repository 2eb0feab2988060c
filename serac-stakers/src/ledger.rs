// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::{
    marshal_diff_key, marshal_start_diff_key, marshal_weight_diff, unmarshal_diff_key,
    unmarshal_weight_diff, DynStakerIterator, DynWeightIterator, SnapshotStakerIterator, Staker,
    StakerDeserializer, StakerSerializer, StakerSetChanges, StakerSortKey, StakersConfig,
    StakersController, StakersError, StakersResult, WeightDiff,
};
use serac_db_exports::{
    DBBatch, DbDirection, DbIteratorMode, ShareableDbController, CHANGE_HEIGHT_DESER_ERROR,
    CHANGE_HEIGHT_KEY, DIFFS_CF, STAKER_DESER_ERROR, STATE_CF,
};
use serac_models::node_id::NodeId;
use serac_models::subnet_id::{SubnetId, SUBNET_ID_SIZE_BYTES};
use serac_models::tx_id::TX_ID_SIZE_BYTES;
use serac_serialization::{DeserializeError, Deserializer, Serializer};
use serac_time::SeracTime;
use std::collections::BTreeMap;
use tracing::debug;

// Staker set idents, first byte of persisted staker record keys
const CURRENT_STAKERS_IDENT: u8 = 0u8;
const PENDING_STAKERS_IDENT: u8 = 1u8;

/// Ledger of the validator staker sets.
///
/// Holds the live current and pending sets in ordered containers keyed by
/// [`StakerSortKey`], the aggregated live weight per `(subnet, node)`, and
/// persists staker records plus per-height weight diffs through the
/// underlying store.
///
/// Single writer: block acceptance is the only mutating path and is
/// serialized by the executor; reads may run concurrently with each other.
pub struct StakerLedger {
    /// staker ledger configuration
    pub config: StakersConfig,
    /// shared handle to the underlying ordered key/value store
    pub db: ShareableDbController,
    /// current (active) stakers, in sort-key order
    current: BTreeMap<StakerSortKey, Staker>,
    /// pending stakers, in sort-key order
    pending: BTreeMap<StakerSortKey, Staker>,
    /// aggregated live weight per subnet and node
    weights: BTreeMap<SubnetId, BTreeMap<NodeId, u64>>,
    /// sort key of the current validator of each `(subnet, node)`
    validator_index: BTreeMap<(SubnetId, NodeId), StakerSortKey>,
    /// height of the last applied block
    last_height: u64,
    /// staker record serializer
    staker_serializer: StakerSerializer,
    /// staker record deserializer
    staker_deserializer: StakerDeserializer,
}

impl StakerLedger {
    /// Creates an empty `StakerLedger` on top of the given store
    pub fn new(config: StakersConfig, db: ShareableDbController) -> Self {
        Self {
            config,
            db,
            current: BTreeMap::new(),
            pending: BTreeMap::new(),
            weights: BTreeMap::new(),
            validator_index: BTreeMap::new(),
            last_height: 0,
            staker_serializer: StakerSerializer::new(),
            staker_deserializer: StakerDeserializer::new(),
        }
    }

    /// After bootstrap or a restart, rebuilds the in-memory sets and the
    /// weight aggregates from the persisted staker records
    pub fn recompute_caches(&mut self) -> StakersResult<()> {
        self.current.clear();
        self.pending.clear();
        self.weights.clear();
        self.validator_index.clear();

        let mut loaded = Vec::new();
        {
            let db = self.db.read();
            for ident in [CURRENT_STAKERS_IDENT, PENDING_STAKERS_IDENT] {
                for (serialized_key, serialized_value) in
                    db.prefix_iterator_cf(STATE_CF, &[ident])
                {
                    if !serialized_key.starts_with(&[ident]) {
                        break;
                    }
                    let (rest, staker) = self
                        .staker_deserializer
                        .deserialize::<DeserializeError>(&serialized_value)
                        .map_err(|_| {
                            StakersError::MalformedValue(STAKER_DESER_ERROR.to_string())
                        })?;
                    if !rest.is_empty() {
                        return Err(StakersError::MalformedValue(
                            STAKER_DESER_ERROR.to_string(),
                        ));
                    }
                    if staker.is_pending() != (ident == PENDING_STAKERS_IDENT) {
                        return Err(StakersError::ContainerInconsistency(format!(
                            "staker {} persisted in the wrong set",
                            staker.tx_id
                        )));
                    }
                    loaded.push(staker);
                }
            }
            self.last_height = match db.get_cf(STATE_CF, CHANGE_HEIGHT_KEY.to_vec())? {
                Some(serialized_height) => u64::from_be_bytes(
                    serialized_height.as_slice().try_into().map_err(|_| {
                        StakersError::MalformedValue(CHANGE_HEIGHT_DESER_ERROR.to_string())
                    })?,
                ),
                None => 0,
            };
        }
        for staker in loaded {
            self.insert_in_cache(staker)?;
        }
        Ok(())
    }

    /// Resets the ledger state, on disk and in memory.
    ///
    /// USED ONLY FOR BOOTSTRAP
    pub fn reset(&mut self) {
        {
            let mut db = self.db.write();
            db.delete_prefix(STATE_CF, &[CURRENT_STAKERS_IDENT]);
            db.delete_prefix(STATE_CF, &[PENDING_STAKERS_IDENT]);
            db.delete_prefix(STATE_CF, CHANGE_HEIGHT_KEY);
            db.delete_prefix(DIFFS_CF, &[]);
        }
        self.current.clear();
        self.pending.clear();
        self.weights.clear();
        self.validator_index.clear();
        self.last_height = 0;
    }

    /// Adds a staker to the live set, stages its persisted record and, for
    /// a staker entering the current set, a weight-increase diff
    pub fn insert_staker(
        &mut self,
        staker: Staker,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()> {
        let key = staker.sort_key();
        let already_there = if staker.is_pending() {
            self.pending.contains_key(&key)
        } else {
            self.current.contains_key(&key)
        };
        if already_there {
            return Err(StakersError::ContainerInconsistency(format!(
                "staker {} is already in the set",
                staker.tx_id
            )));
        }
        self.put_staker_entry(&staker, batch)?;
        if staker.is_current() {
            self.put_weight_diff(
                &staker.subnet_id,
                height,
                &staker.node_id,
                false,
                staker.weight,
                diffs_batch,
            )?;
        }
        self.insert_in_cache(staker)
    }

    /// Removes a staker from the live set; a staker leaving the current
    /// set also stages a weight-decrease diff
    pub fn remove_staker(
        &mut self,
        staker: &Staker,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()> {
        let key = staker.sort_key();
        let removed = if staker.is_pending() {
            self.pending.remove(&key)
        } else {
            self.current.remove(&key)
        };
        let Some(removed) = removed else {
            return Err(StakersError::StakerNotFound(format!(
                "staker {} is not in the set",
                staker.tx_id
            )));
        };
        self.delete_staker_entry(&removed, batch);
        if removed.is_current() {
            if removed.priority.is_validator() {
                self.validator_index
                    .remove(&(removed.subnet_id, removed.node_id));
            }
            self.sub_weight(removed.subnet_id, removed.node_id, removed.weight)?;
            self.put_weight_diff(
                &removed.subnet_id,
                height,
                &removed.node_id,
                true,
                removed.weight,
                diffs_batch,
            )?;
        }
        Ok(())
    }

    /// Adjusts the weight of the current validator of `node_id` on
    /// `subnet_id`, staging the (aggregated) diff at `height`.
    ///
    /// Returns the net diff staged for that `(subnet, height, node)`
    /// coordinate after this change.
    #[allow(clippy::too_many_arguments)]
    pub fn update_weight(
        &mut self,
        subnet_id: &SubnetId,
        node_id: &NodeId,
        height: u64,
        decrease: bool,
        amount: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<WeightDiff> {
        let key = *self
            .validator_index
            .get(&(*subnet_id, *node_id))
            .ok_or_else(|| {
                StakersError::StakerNotFound(format!(
                    "no current validator for node {} on subnet {}",
                    node_id, subnet_id
                ))
            })?;
        let staker_weight = self
            .current
            .get(&key)
            .ok_or_else(|| {
                StakersError::ContainerInconsistency(
                    "validator index out of sync with the current set".to_string(),
                )
            })?
            .weight;
        let node_weight = self
            .weights
            .get(subnet_id)
            .and_then(|subnet_weights| subnet_weights.get(node_id))
            .copied()
            .unwrap_or(0);

        // validate both the record and the aggregate before committing
        let change = WeightDiff::new(decrease, amount);
        let new_staker_weight = change.apply_to(staker_weight)?;
        let new_node_weight = change.apply_to(node_weight)?;

        let staker = self.current.get_mut(&key).ok_or_else(|| {
            StakersError::ContainerInconsistency(
                "validator index out of sync with the current set".to_string(),
            )
        })?;
        staker.weight = new_staker_weight;
        self.set_node_weight(*subnet_id, *node_id, new_node_weight);

        let staker = self.current.get(&key).ok_or_else(|| {
            StakersError::ContainerInconsistency(
                "validator index out of sync with the current set".to_string(),
            )
        })?;
        self.put_staker_entry(staker, batch)?;
        self.put_weight_diff(subnet_id, height, node_id, decrease, amount, diffs_batch)
    }

    /// Applies a whole block's accumulated staker set changes at `height`.
    ///
    /// This is the canonical mutation path: the caller writes the two
    /// batches in one store transaction, so all the diffs of the height
    /// become durable together with the set mutations that produced them.
    pub fn apply_changes_to_batch(
        &mut self,
        changes: StakerSetChanges,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()> {
        if height < self.last_height {
            return Err(StakersError::ContainerInconsistency(format!(
                "cannot apply changes for height {} after height {}",
                height, self.last_height
            )));
        }
        let (added, removed, weight_changes) =
            (changes.added, changes.removed, changes.weight_changes);
        for staker in added {
            self.insert_staker(staker, height, batch, diffs_batch)?;
        }
        for staker in &removed {
            self.remove_staker(staker, height, batch, diffs_batch)?;
        }
        for ((subnet_id, node_id), diff) in weight_changes {
            self.update_weight(
                &subnet_id,
                &node_id,
                height,
                diff.decrease,
                diff.amount,
                batch,
                diffs_batch,
            )?;
        }
        self.last_height = height;
        {
            let db = self.db.read();
            db.put_or_update_entry_value(
                batch,
                CHANGE_HEIGHT_KEY.to_vec(),
                &height.to_be_bytes(),
            );
        }
        debug!("staker ledger changes applied for height {}", height);
        Ok(())
    }
}

// Queries
impl StakerLedger {
    /// Height of the last applied block
    pub fn last_height(&self) -> u64 {
        self.last_height
    }

    /// The earliest instant at which the given staker can be stopped,
    /// applying the configured notice policy
    pub fn earliest_stop_time(&self, staker: &Staker) -> SeracTime {
        staker.earliest_stop_time(self.config.stop_notice_periods)
    }

    /// Aggregated live weight of a node on a subnet
    pub fn get_weight(&self, subnet_id: &SubnetId, node_id: &NodeId) -> u64 {
        self.weights
            .get(subnet_id)
            .and_then(|subnet_weights| subnet_weights.get(node_id))
            .copied()
            .unwrap_or_default()
    }

    /// Reconstructs the validator set of `subnet_id` as it was at `height`.
    ///
    /// Starts from the live weights and walks the persisted diffs in
    /// descending height order, inverting each one, stopping exactly at
    /// the target height. A malformed persisted diff halts the
    /// reconstruction with an error.
    pub fn stakers_at(
        &self,
        subnet_id: &SubnetId,
        height: u64,
    ) -> StakersResult<DynWeightIterator> {
        if height > self.last_height {
            return Err(StakersError::HeightUnavailable(height));
        }
        let mut weights = self.weights.get(subnet_id).cloned().unwrap_or_default();
        if height < self.last_height {
            let db = self.db.read();
            let start_key = marshal_start_diff_key(subnet_id, self.last_height);
            for (serialized_key, serialized_value) in db.iterator_cf(
                DIFFS_CF,
                DbIteratorMode::From(&start_key, DbDirection::Forward),
            ) {
                let (key_subnet_id, key_height, node_id) = unmarshal_diff_key(&serialized_key)?;
                if key_subnet_id != *subnet_id || key_height <= height {
                    break;
                }
                let diff = unmarshal_weight_diff(&serialized_value)?;
                let node_weight = weights.get(&node_id).copied().unwrap_or(0);
                let reverted_weight = diff.invert_on(node_weight)?;
                if reverted_weight == 0 {
                    weights.remove(&node_id);
                } else {
                    weights.insert(node_id, reverted_weight);
                }
            }
        }
        Ok(Box::new(weights.into_iter()))
    }

    /// Iterates the current set of `subnet_id` in sort-key order.
    ///
    /// The iterator walks a snapshot: it stays valid whatever happens to
    /// the ledger afterwards, and releases nothing but memory on drop.
    pub fn current_set_iterator(&self, subnet_id: &SubnetId) -> DynStakerIterator<'_> {
        Box::new(SnapshotStakerIterator::new(
            self.current
                .values()
                .filter(|staker| staker.subnet_id == *subnet_id)
                .cloned()
                .collect(),
        ))
    }

    /// Iterates the pending set of `subnet_id` in sort-key order
    pub fn pending_set_iterator(&self, subnet_id: &SubnetId) -> DynStakerIterator<'_> {
        Box::new(SnapshotStakerIterator::new(
            self.pending
                .values()
                .filter(|staker| staker.subnet_id == *subnet_id)
                .cloned()
                .collect(),
        ))
    }
}

// Store helpers
impl StakerLedger {
    /// Key of a persisted staker record: `[set ident] + [subnet] + [tx id]`
    fn staker_entry_key(staker: &Staker) -> Vec<u8> {
        let ident = if staker.is_pending() {
            PENDING_STAKERS_IDENT
        } else {
            CURRENT_STAKERS_IDENT
        };
        let mut key = Vec::with_capacity(1 + SUBNET_ID_SIZE_BYTES + TX_ID_SIZE_BYTES);
        key.push(ident);
        key.extend_from_slice(staker.subnet_id.as_bytes());
        key.extend_from_slice(staker.tx_id.as_bytes());
        key
    }

    fn put_staker_entry(&self, staker: &Staker, batch: &mut DBBatch) -> StakersResult<()> {
        let mut serialized_staker = Vec::new();
        self.staker_serializer
            .serialize(staker, &mut serialized_staker)?;
        let db = self.db.read();
        db.put_or_update_entry_value(batch, Self::staker_entry_key(staker), &serialized_staker);
        Ok(())
    }

    fn delete_staker_entry(&self, staker: &Staker, batch: &mut DBBatch) {
        let db = self.db.read();
        db.delete_key(batch, Self::staker_entry_key(staker));
    }

    /// Stages a weight diff, folding it into any diff already staged for
    /// the same `(subnet, height, node)` coordinate in this batch. Diffs
    /// netting out to zero are not persisted.
    fn put_weight_diff(
        &self,
        subnet_id: &SubnetId,
        height: u64,
        node_id: &NodeId,
        decrease: bool,
        amount: u64,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<WeightDiff> {
        let mut diff = WeightDiff::default();
        if amount == 0 {
            return Ok(diff);
        }
        let serialized_key = marshal_diff_key(subnet_id, height, node_id);
        if let Some(Some(serialized_diff)) = diffs_batch.get(&serialized_key) {
            diff = unmarshal_weight_diff(serialized_diff)?;
        }
        diff.merge(decrease, amount)?;
        let db = self.db.read();
        if diff.is_zero() {
            db.delete_key(diffs_batch, serialized_key);
        } else {
            db.put_or_update_entry_value(diffs_batch, serialized_key, &marshal_weight_diff(&diff));
        }
        Ok(diff)
    }

    fn insert_in_cache(&mut self, staker: Staker) -> StakersResult<()> {
        let key = staker.sort_key();
        let tx_id = staker.tx_id;
        if staker.is_pending() {
            if self.pending.insert(key, staker).is_some() {
                return Err(StakersError::ContainerInconsistency(format!(
                    "duplicate pending staker {}",
                    tx_id
                )));
            }
        } else {
            if staker.priority.is_validator()
                && self
                    .validator_index
                    .insert((staker.subnet_id, staker.node_id), key)
                    .is_some()
            {
                return Err(StakersError::ContainerInconsistency(format!(
                    "node {} already has a current validator on subnet {}",
                    staker.node_id, staker.subnet_id
                )));
            }
            self.add_weight(staker.subnet_id, staker.node_id, staker.weight)?;
            if self.current.insert(key, staker).is_some() {
                return Err(StakersError::ContainerInconsistency(format!(
                    "duplicate current staker {}",
                    tx_id
                )));
            }
        }
        Ok(())
    }

    fn add_weight(
        &mut self,
        subnet_id: SubnetId,
        node_id: NodeId,
        amount: u64,
    ) -> StakersResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let node_weight = self
            .weights
            .entry(subnet_id)
            .or_default()
            .entry(node_id)
            .or_insert(0);
        *node_weight = node_weight.checked_add(amount).ok_or_else(|| {
            StakersError::OverflowError("aggregated node weight overflow".to_string())
        })?;
        Ok(())
    }

    fn sub_weight(
        &mut self,
        subnet_id: SubnetId,
        node_id: NodeId,
        amount: u64,
    ) -> StakersResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let subnet_weights = self.weights.get_mut(&subnet_id).ok_or_else(|| {
            StakersError::ContainerInconsistency(
                "removing weight from an unknown subnet".to_string(),
            )
        })?;
        let node_weight = subnet_weights.get_mut(&node_id).ok_or_else(|| {
            StakersError::ContainerInconsistency(
                "removing weight from an unknown node".to_string(),
            )
        })?;
        *node_weight = node_weight.checked_sub(amount).ok_or_else(|| {
            StakersError::OverflowError("aggregated node weight underflow".to_string())
        })?;
        if *node_weight == 0 {
            subnet_weights.remove(&node_id);
            if subnet_weights.is_empty() {
                self.weights.remove(&subnet_id);
            }
        }
        Ok(())
    }

    fn set_node_weight(&mut self, subnet_id: SubnetId, node_id: NodeId, weight: u64) {
        if weight == 0 {
            if let Some(subnet_weights) = self.weights.get_mut(&subnet_id) {
                subnet_weights.remove(&node_id);
                if subnet_weights.is_empty() {
                    self.weights.remove(&subnet_id);
                }
            }
        } else {
            self.weights
                .entry(subnet_id)
                .or_default()
                .insert(node_id, weight);
        }
    }
}

impl StakersController for StakerLedger {
    fn insert_staker(
        &mut self,
        staker: Staker,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()> {
        StakerLedger::insert_staker(self, staker, height, batch, diffs_batch)
    }

    fn remove_staker(
        &mut self,
        staker: &Staker,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()> {
        StakerLedger::remove_staker(self, staker, height, batch, diffs_batch)
    }

    fn update_weight(
        &mut self,
        subnet_id: &SubnetId,
        node_id: &NodeId,
        height: u64,
        decrease: bool,
        amount: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<WeightDiff> {
        StakerLedger::update_weight(
            self, subnet_id, node_id, height, decrease, amount, batch, diffs_batch,
        )
    }

    fn apply_changes_to_batch(
        &mut self,
        changes: StakerSetChanges,
        height: u64,
        batch: &mut DBBatch,
        diffs_batch: &mut DBBatch,
    ) -> StakersResult<()> {
        StakerLedger::apply_changes_to_batch(self, changes, height, batch, diffs_batch)
    }

    fn stakers_at(&self, subnet_id: &SubnetId, height: u64) -> StakersResult<DynWeightIterator> {
        StakerLedger::stakers_at(self, subnet_id, height)
    }

    fn current_set_iterator(&self, subnet_id: &SubnetId) -> DynStakerIterator<'_> {
        StakerLedger::current_set_iterator(self, subnet_id)
    }

    fn pending_set_iterator(&self, subnet_id: &SubnetId) -> DynStakerIterator<'_> {
        StakerLedger::pending_set_iterator(self, subnet_id)
    }
}
