// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::{Staker, StakerSortKey};
use serac_models::node_id::NodeId;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Lazy, forward-only, finite sequence of stakers in sort-key order.
///
/// Whatever cursor or lock the underlying source holds is released when the
/// iterator is dropped, on every exit path including early termination.
pub type DynStakerIterator<'a> = Box<dyn Iterator<Item = Staker> + 'a>;

/// Lazy sequence of `(node, weight)` pairs of a reconstructed validator set
pub type DynWeightIterator = Box<dyn Iterator<Item = (NodeId, u64)>>;

/// An iterator yielding no stakers
pub fn empty_staker_iterator() -> DynStakerIterator<'static> {
    Box::new(std::iter::empty())
}

/// Iterator over a snapshot of stakers already in sort-key order.
///
/// Snapshots stay valid whatever happens to the set they were taken from.
pub struct SnapshotStakerIterator {
    inner: std::vec::IntoIter<Staker>,
}

impl SnapshotStakerIterator {
    /// Builds the iterator from a vector sorted by sort key
    pub fn new(stakers: Vec<Staker>) -> Self {
        debug_assert!(stakers.windows(2).all(|w| w[0].sort_key() < w[1].sort_key()));
        Self {
            inner: stakers.into_iter(),
        }
    }
}

impl Iterator for SnapshotStakerIterator {
    type Item = Staker;

    fn next(&mut self) -> Option<Staker> {
        self.inner.next()
    }
}

struct MergeEntry {
    key: StakerSortKey,
    source: usize,
    staker: Staker,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        (self.key, self.source) == (other.key, other.source)
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.key, self.source).cmp(&(other.key, other.source))
    }
}

/// Merges any number of sort-key-ordered staker sources into a single
/// ordered sequence, e.g. in-memory uncommitted stakers with persisted
/// ones.
///
/// Sources are drained lazily: a source is only advanced when its head is
/// the smallest remaining entry.
pub struct MergedStakerIterator<'a> {
    heap: BinaryHeap<Reverse<MergeEntry>>,
    sources: Vec<DynStakerIterator<'a>>,
}

impl<'a> MergedStakerIterator<'a> {
    /// Builds the merge from its underlying sources
    pub fn new(mut sources: Vec<DynStakerIterator<'a>>) -> Self {
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (index, source) in sources.iter_mut().enumerate() {
            if let Some(staker) = source.next() {
                heap.push(Reverse(MergeEntry {
                    key: staker.sort_key(),
                    source: index,
                    staker,
                }));
            }
        }
        Self { heap, sources }
    }
}

impl Iterator for MergedStakerIterator<'_> {
    type Item = Staker;

    fn next(&mut self) -> Option<Staker> {
        let Reverse(entry) = self.heap.pop()?;
        if let Some(staker) = self.sources[entry.source].next() {
            self.heap.push(Reverse(MergeEntry {
                key: staker.sort_key(),
                source: entry.source,
                staker,
            }));
        }
        Some(entry.staker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StakerPriority, StakerTiming};
    use serac_models::node_id::{NodeId, NODE_ID_SIZE_BYTES};
    use serac_models::subnet_id::SubnetId;
    use serac_models::tx_id::{TxId, TX_ID_SIZE_BYTES};
    use serac_time::SeracTime;

    fn staker(next_millis: u64, tx_byte: u8) -> Staker {
        Staker {
            tx_id: TxId::from_bytes([tx_byte; TX_ID_SIZE_BYTES]),
            node_id: NodeId::from_bytes([1u8; NODE_ID_SIZE_BYTES]),
            public_key: None,
            subnet_id: SubnetId::PRIMARY_NETWORK,
            weight: 1,
            potential_reward: 0,
            timing: StakerTiming::Pending {
                start: SeracTime::from_millis(next_millis),
                period: SeracTime::from_millis(100),
                end: SeracTime::from_millis(next_millis + 100),
            },
            priority: StakerPriority::PrimaryNetworkValidatorPending,
        }
    }

    #[test]
    fn test_snapshot_iterator_yields_in_order() {
        let stakers = vec![staker(1, 0), staker(2, 0), staker(3, 0)];
        let result: Vec<Staker> = SnapshotStakerIterator::new(stakers.clone()).collect();
        assert_eq!(result, stakers);
    }

    #[test]
    fn test_merge_interleaves_sources() {
        let source_a: DynStakerIterator =
            Box::new(SnapshotStakerIterator::new(vec![staker(1, 0), staker(4, 0)]));
        let source_b: DynStakerIterator =
            Box::new(SnapshotStakerIterator::new(vec![staker(2, 0), staker(5, 0)]));
        let source_c: DynStakerIterator =
            Box::new(SnapshotStakerIterator::new(vec![staker(3, 0), staker(6, 0)]));

        let merged: Vec<u64> = MergedStakerIterator::new(vec![source_a, source_b, source_c])
            .map(|s| s.next_time().to_millis())
            .collect();
        assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_merge_breaks_key_ties_deterministically() {
        // same sort key in two sources: the first source wins, nothing is lost
        let source_a: DynStakerIterator =
            Box::new(SnapshotStakerIterator::new(vec![staker(1, 7)]));
        let source_b: DynStakerIterator =
            Box::new(SnapshotStakerIterator::new(vec![staker(1, 7)]));

        let merged: Vec<Staker> =
            MergedStakerIterator::new(vec![source_a, source_b]).collect();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], merged[1]);
    }

    #[test]
    fn test_merge_with_empty_sources() {
        let merged: Vec<Staker> = MergedStakerIterator::new(vec![
            empty_staker_iterator(),
            Box::new(SnapshotStakerIterator::new(vec![staker(1, 0)])),
            empty_staker_iterator(),
        ])
        .collect();
        assert_eq!(merged.len(), 1);

        assert!(MergedStakerIterator::new(vec![]).next().is_none());
        assert!(empty_staker_iterator().next().is_none());
    }
}
