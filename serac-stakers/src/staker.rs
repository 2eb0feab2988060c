// Copyright (c) 2025 SERAC LABS <info@serac.network>

use crate::{StakerPriority, StakersError, StakersResult};
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use serac_models::bls::{BlsPublicKey, BlsPublicKeyDeserializer, BlsPublicKeySerializer};
use serac_models::node_id::{NodeId, NodeIdDeserializer, NodeIdSerializer};
use serac_models::subnet_id::{SubnetId, SubnetIdDeserializer, SubnetIdSerializer};
use serac_models::tx_id::{TxId, TxIdDeserializer, TxIdSerializer};
use serac_serialization::{
    Deserializer, OptionDeserializer, OptionSerializer, SerializeError, Serializer,
    U64VarIntDeserializer, U64VarIntSerializer,
};
use serac_time::{SeracTime, SeracTimeDeserializer, SeracTimeSerializer};
use std::ops::Bound::Included;

// Timing variant idents, part of the persisted staker encoding
const PENDING_TIMING_IDENT: u8 = 0u8;
const CURRENT_TIMING_IDENT: u8 = 1u8;

/// View of an accepted stake-adding transaction, as exposed by the executor.
pub trait StakeTx {
    /// The validating node the stake is bound to
    fn node_id(&self) -> NodeId;
    /// The BLS public key attached to the stake, if any.
    ///
    /// An error here rejects the originating transaction; an absent key
    /// (delegator, or staker predating the key requirement) is not an error.
    fn public_key(&self) -> StakersResult<Option<BlsPublicKey>>;
    /// The subnet the stake applies to
    fn subnet_id(&self) -> SubnetId;
    /// Consensus weight added by the stake
    fn weight(&self) -> u64;
    /// Length of one staking period
    fn staking_period(&self) -> SeracTime;
    /// Priority of the resulting staker in the current set
    fn current_priority(&self) -> StakerPriority;
}

/// View of a legacy stake-adding transaction whose start and end times are
/// fixed at creation (pending set model).
pub trait PendingStakeTx: StakeTx {
    /// The instant the staker enters the current set
    fn start_time(&self) -> SeracTime;
    /// The instant the staker exits the current set
    fn end_time(&self) -> SeracTime;
    /// Priority of the resulting staker in the pending set
    fn pending_priority(&self) -> StakerPriority;
}

/// Lifecycle window of a staker.
///
/// The two staking models are distinct variants so that transitions that
/// only make sense for one of them cannot be applied to the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakerTiming {
    /// Legacy model: the window is fixed by the transaction that created
    /// the staker, which waits in the pending set until `start`.
    Pending {
        /// the instant the staker enters the current set
        start: SeracTime,
        /// length of one staking period, `end - start` at creation
        period: SeracTime,
        /// the instant the staker exits the current set
        end: SeracTime,
    },
    /// Continuous model: the staker is current as soon as its transaction
    /// is accepted and restakes every `period` until an explicit stop sets
    /// a finite `end`.
    Current {
        /// start of the staking period currently running
        start: SeracTime,
        /// length of one staking period
        period: SeracTime,
        /// the instant the staker exits the current set, `None` until a
        /// stop is requested
        end: Option<SeracTime>,
    },
}

impl StakerTiming {
    /// The next instant this staker transitions: entry into the current set
    /// for a pending staker, end of the running period for a current one.
    ///
    /// Derived from the variant fields, so it can never go stale.
    pub fn next_time(&self) -> SeracTime {
        match self {
            StakerTiming::Pending { start, .. } => *start,
            StakerTiming::Current { start, period, .. } => start.saturating_add(*period),
        }
    }

    /// Start of the staking period currently running
    pub fn start_time(&self) -> SeracTime {
        match self {
            StakerTiming::Pending { start, .. } => *start,
            StakerTiming::Current { start, .. } => *start,
        }
    }

    /// The instant the staker exits the current set, if one is set
    pub fn end_time(&self) -> Option<SeracTime> {
        match self {
            StakerTiming::Pending { end, .. } => Some(*end),
            StakerTiming::Current { end, .. } => *end,
        }
    }

    /// Length of one staking period.
    ///
    /// Note that once an explicit stop has moved `end`, it is no longer
    /// true that `period == end - start`.
    pub fn staking_period(&self) -> SeracTime {
        match self {
            StakerTiming::Pending { period, .. } => *period,
            StakerTiming::Current { period, .. } => *period,
        }
    }
}

/// Sort key defining the total order over stakers.
///
/// Earlier transition time sorts first; priority breaks time ties; the
/// transaction id breaks the remaining ties byte-wise, so no two distinct
/// stakers ever compare equal and ordered containers stay deterministic
/// across nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StakerSortKey {
    /// the staker's next transition time
    pub next_time: SeracTime,
    /// tie-break for equal transition times
    pub priority: StakerPriority,
    /// final byte-wise tie-break
    pub tx_id: TxId,
}

/// All information required to represent a validator or delegator in the
/// current and pending validator sets.
///
/// Invariant: every field is fixed-width, so the record size is bounded
/// regardless of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staker {
    /// transaction that created (or last modified) this staker
    pub tx_id: TxId,
    /// the validating node
    pub node_id: NodeId,
    /// BLS public key, absent for delegators and stakers predating the key
    /// requirement
    pub public_key: Option<BlsPublicKey>,
    /// the subnet this staker participates in
    pub subnet_id: SubnetId,
    /// consensus weight
    pub weight: u64,
    /// reward granted if the staker completes its period honestly
    pub potential_reward: u64,
    /// lifecycle window
    pub timing: StakerTiming,
    /// tie-break tag, consistent with the timing variant
    pub priority: StakerPriority,
}

impl Staker {
    /// Builds a staker entering the current set immediately (continuous
    /// model): no fixed end until an explicit stop, first transition one
    /// staking period after `start_time`.
    pub fn new_current(
        tx_id: TxId,
        stake: &dyn StakeTx,
        start_time: SeracTime,
        potential_reward: u64,
    ) -> StakersResult<Staker> {
        let public_key = stake.public_key()?;
        let priority = stake.current_priority();
        debug_assert!(priority.is_current());
        Ok(Staker {
            tx_id,
            node_id: stake.node_id(),
            public_key,
            subnet_id: stake.subnet_id(),
            weight: stake.weight(),
            potential_reward,
            timing: StakerTiming::Current {
                start: start_time,
                period: stake.staking_period(),
                end: None,
            },
            priority,
        })
    }

    /// Builds a staker for the legacy pending set model: the window is
    /// fixed by the transaction and the first transition is the entry into
    /// the current set.
    pub fn new_pending(tx_id: TxId, stake: &dyn PendingStakeTx) -> StakersResult<Staker> {
        let public_key = stake.public_key()?;
        let priority = stake.pending_priority();
        debug_assert!(priority.is_pending());
        let start = stake.start_time();
        let end = stake.end_time();
        Ok(Staker {
            tx_id,
            node_id: stake.node_id(),
            public_key,
            subnet_id: stake.subnet_id(),
            weight: stake.weight(),
            potential_reward: 0,
            timing: StakerTiming::Pending {
                start,
                period: end.saturating_sub(start),
                end,
            },
            priority,
        })
    }

    /// The next instant this staker transitions
    pub fn next_time(&self) -> SeracTime {
        self.timing.next_time()
    }

    /// Start of the staking period currently running
    pub fn start_time(&self) -> SeracTime {
        self.timing.start_time()
    }

    /// The instant the staker exits the current set, if one is set
    pub fn end_time(&self) -> Option<SeracTime> {
        self.timing.end_time()
    }

    /// Length of one staking period
    pub fn staking_period(&self) -> SeracTime {
        self.timing.staking_period()
    }

    /// Whether this staker waits in the pending set
    pub fn is_pending(&self) -> bool {
        matches!(self.timing, StakerTiming::Pending { .. })
    }

    /// Whether this staker is in the current set
    pub fn is_current(&self) -> bool {
        !self.is_pending()
    }

    /// Key used by every ordered container holding stakers
    pub fn sort_key(&self) -> StakerSortKey {
        StakerSortKey {
            next_time: self.next_time(),
            priority: self.priority,
            tx_id: self.tx_id,
        }
    }

    /// Moves the staker one staking period ahead (auto-restake).
    ///
    /// No-op for pending stakers and for stakers whose next transition is
    /// already their end of life.
    pub fn shift_ahead(&mut self) {
        match &mut self.timing {
            StakerTiming::Pending { .. } => (), // never shift pending stakers
            StakerTiming::Current { start, period, end } => {
                if let Some(end) = end {
                    if start.saturating_add(*period) == *end {
                        return; // staker reached end of life
                    }
                }
                *start = start.saturating_add(*period);
            }
        }
    }

    /// The earliest instant at which a stop request can take effect.
    ///
    /// A primary-network validator owes `notice_periods` extra staking
    /// periods of notice; everyone else can stop at the next transition.
    /// Never later than the staker's end time.
    pub fn earliest_stop_time(&self, notice_periods: u64) -> SeracTime {
        let mut candidate = self.next_time();
        if self.priority.is_validator() && self.subnet_id.is_primary_network() {
            candidate =
                candidate.saturating_add(self.staking_period().saturating_mul(notice_periods));
        }
        match self.end_time() {
            Some(end) if end < candidate => end,
            _ => candidate,
        }
    }

    /// Requests the staker to stop before `stop_time`, snapping the end to
    /// the next staking-period boundary at or after the requested instant
    /// so that no period is cut short.
    ///
    /// No-op if the staker already ends at or before `stop_time`.
    pub fn mark_for_removal_before_time(&mut self, stop_time: SeracTime) {
        if let Some(end) = self.end_time() {
            if stop_time >= end {
                return;
            }
        }
        let period = self.staking_period();
        let mut new_end = self.next_time();
        while new_end < stop_time {
            new_end = new_end.saturating_add(period);
        }
        match &mut self.timing {
            StakerTiming::Pending { end, .. } => *end = new_end,
            StakerTiming::Current { end, .. } => *end = Some(new_end),
        }
    }
}

/// Serializer for `Staker`, used for the persisted staker records
pub struct StakerSerializer {
    tx_id_serializer: TxIdSerializer,
    node_id_serializer: NodeIdSerializer,
    subnet_id_serializer: SubnetIdSerializer,
    opt_public_key_serializer: OptionSerializer<BlsPublicKey, BlsPublicKeySerializer>,
    u64_serializer: U64VarIntSerializer,
    time_serializer: SeracTimeSerializer,
    opt_time_serializer: OptionSerializer<SeracTime, SeracTimeSerializer>,
}

impl StakerSerializer {
    /// Creates a new `StakerSerializer`
    pub fn new() -> Self {
        Self {
            tx_id_serializer: TxIdSerializer::new(),
            node_id_serializer: NodeIdSerializer::new(),
            subnet_id_serializer: SubnetIdSerializer::new(),
            opt_public_key_serializer: OptionSerializer::new(BlsPublicKeySerializer::new()),
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: SeracTimeSerializer::new(),
            opt_time_serializer: OptionSerializer::new(SeracTimeSerializer::new()),
        }
    }
}

impl Default for StakerSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Staker> for StakerSerializer {
    fn serialize(&self, value: &Staker, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.tx_id_serializer.serialize(&value.tx_id, buffer)?;
        self.node_id_serializer.serialize(&value.node_id, buffer)?;
        self.subnet_id_serializer
            .serialize(&value.subnet_id, buffer)?;
        self.opt_public_key_serializer
            .serialize(&value.public_key, buffer)?;
        self.u64_serializer.serialize(&value.weight, buffer)?;
        self.u64_serializer
            .serialize(&value.potential_reward, buffer)?;
        buffer.push(value.priority as u8);
        match &value.timing {
            StakerTiming::Pending { start, period, end } => {
                buffer.push(PENDING_TIMING_IDENT);
                self.time_serializer.serialize(start, buffer)?;
                self.time_serializer.serialize(period, buffer)?;
                self.time_serializer.serialize(end, buffer)?;
            }
            StakerTiming::Current { start, period, end } => {
                buffer.push(CURRENT_TIMING_IDENT);
                self.time_serializer.serialize(start, buffer)?;
                self.time_serializer.serialize(period, buffer)?;
                self.opt_time_serializer.serialize(end, buffer)?;
            }
        }
        Ok(())
    }
}

/// Deserializer for `Staker`
pub struct StakerDeserializer {
    tx_id_deserializer: TxIdDeserializer,
    node_id_deserializer: NodeIdDeserializer,
    subnet_id_deserializer: SubnetIdDeserializer,
    opt_public_key_deserializer: OptionDeserializer<BlsPublicKey, BlsPublicKeyDeserializer>,
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: SeracTimeDeserializer,
    opt_time_deserializer: OptionDeserializer<SeracTime, SeracTimeDeserializer>,
}

impl StakerDeserializer {
    /// Creates a new `StakerDeserializer`
    pub fn new() -> Self {
        Self {
            tx_id_deserializer: TxIdDeserializer::new(),
            node_id_deserializer: NodeIdDeserializer::new(),
            subnet_id_deserializer: SubnetIdDeserializer::new(),
            opt_public_key_deserializer: OptionDeserializer::new(BlsPublicKeyDeserializer::new()),
            u64_deserializer: U64VarIntDeserializer::new(
                Included(u64::MIN),
                Included(u64::MAX),
            ),
            time_deserializer: SeracTimeDeserializer::new((
                Included(SeracTime::from_millis(u64::MIN)),
                Included(SeracTime::from_millis(u64::MAX)),
            )),
            opt_time_deserializer: OptionDeserializer::new(SeracTimeDeserializer::new((
                Included(SeracTime::from_millis(u64::MIN)),
                Included(SeracTime::from_millis(u64::MAX)),
            ))),
        }
    }
}

impl Default for StakerDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Staker> for StakerDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Staker, E> {
        context("Failed Staker deserialization", |input: &'a [u8]| {
            let (rest, tx_id) = self.tx_id_deserializer.deserialize(input)?;
            let (rest, node_id) = self.node_id_deserializer.deserialize(rest)?;
            let (rest, subnet_id) = self.subnet_id_deserializer.deserialize(rest)?;
            let (rest, public_key) = self.opt_public_key_deserializer.deserialize(rest)?;
            let (rest, weight) = self.u64_deserializer.deserialize(rest)?;
            let (rest, potential_reward) = self.u64_deserializer.deserialize(rest)?;
            let (rest, priority_byte) = take(1usize)(rest)?;
            let priority = StakerPriority::try_from(priority_byte[0]).map_err(|_| {
                nom::Err::Error(E::from_error_kind(input, ErrorKind::Tag))
            })?;
            let (rest, timing_ident) = take(1usize)(rest)?;
            let (rest, timing) = match timing_ident[0] {
                PENDING_TIMING_IDENT => {
                    let (rest, start) = self.time_deserializer.deserialize(rest)?;
                    let (rest, period) = self.time_deserializer.deserialize(rest)?;
                    let (rest, end) = self.time_deserializer.deserialize(rest)?;
                    (rest, StakerTiming::Pending { start, period, end })
                }
                CURRENT_TIMING_IDENT => {
                    let (rest, start) = self.time_deserializer.deserialize(rest)?;
                    let (rest, period) = self.time_deserializer.deserialize(rest)?;
                    let (rest, end) = self.opt_time_deserializer.deserialize(rest)?;
                    (rest, StakerTiming::Current { start, period, end })
                }
                _ => {
                    return Err(nom::Err::Error(E::from_error_kind(
                        input,
                        ErrorKind::Tag,
                    )))
                }
            };
            Ok((
                rest,
                Staker {
                    tx_id,
                    node_id,
                    public_key,
                    subnet_id,
                    weight,
                    potential_reward,
                    timing,
                    priority,
                },
            ))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serac_models::bls::BLS_PUBLIC_KEY_SIZE_BYTES;
    use serac_models::node_id::NODE_ID_SIZE_BYTES;
    use serac_models::subnet_id::SUBNET_ID_SIZE_BYTES;
    use serac_models::tx_id::TX_ID_SIZE_BYTES;
    use serac_serialization::DeserializeError;

    const SECOND: u64 = 1_000;

    struct TestStake {
        node_id: NodeId,
        public_key: StakersResult<Option<BlsPublicKey>>,
        subnet_id: SubnetId,
        weight: u64,
        staking_period: SeracTime,
        start_time: SeracTime,
        end_time: SeracTime,
        validator: bool,
    }

    impl TestStake {
        fn validator(subnet_id: SubnetId) -> Self {
            Self {
                node_id: NodeId::from_bytes([3u8; NODE_ID_SIZE_BYTES]),
                public_key: Ok(Some(BlsPublicKey::from_bytes(
                    [7u8; BLS_PUBLIC_KEY_SIZE_BYTES],
                ))),
                subnet_id,
                weight: 2_000,
                staking_period: SeracTime::from_millis(1_000 * SECOND),
                start_time: SeracTime::from_millis(50 * SECOND),
                end_time: SeracTime::from_millis(1_050 * SECOND),
                validator: true,
            }
        }
    }

    impl StakeTx for TestStake {
        fn node_id(&self) -> NodeId {
            self.node_id
        }

        fn public_key(&self) -> StakersResult<Option<BlsPublicKey>> {
            match &self.public_key {
                Ok(key) => Ok(key.clone()),
                Err(_) => Err(StakersError::MissingPublicKey(
                    "cannot extract the stake public key".to_string(),
                )),
            }
        }

        fn subnet_id(&self) -> SubnetId {
            self.subnet_id
        }

        fn weight(&self) -> u64 {
            self.weight
        }

        fn staking_period(&self) -> SeracTime {
            self.staking_period
        }

        fn current_priority(&self) -> StakerPriority {
            if self.validator {
                if self.subnet_id.is_primary_network() {
                    StakerPriority::PrimaryNetworkValidatorCurrent
                } else {
                    StakerPriority::SubnetValidatorCurrent
                }
            } else if self.subnet_id.is_primary_network() {
                StakerPriority::PrimaryNetworkDelegatorCurrent
            } else {
                StakerPriority::SubnetDelegatorCurrent
            }
        }
    }

    impl PendingStakeTx for TestStake {
        fn start_time(&self) -> SeracTime {
            self.start_time
        }

        fn end_time(&self) -> SeracTime {
            self.end_time
        }

        fn pending_priority(&self) -> StakerPriority {
            if self.validator {
                if self.subnet_id.is_primary_network() {
                    StakerPriority::PrimaryNetworkValidatorPending
                } else {
                    StakerPriority::SubnetValidatorPending
                }
            } else if self.subnet_id.is_primary_network() {
                StakerPriority::PrimaryNetworkDelegatorPending
            } else {
                StakerPriority::SubnetDelegatorPending
            }
        }
    }

    fn staker_with(next_millis: u64, priority: StakerPriority, tx_byte: u8) -> Staker {
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
            priority,
        }
    }

    #[test]
    fn test_ordering_tie_breaks() {
        // earlier next time wins whatever the other fields say
        let a = staker_with(10, StakerPriority::PrimaryNetworkValidatorCurrent, 0xFF);
        let b = staker_with(20, StakerPriority::PrimaryNetworkValidatorPending, 0x00);
        assert!(a.sort_key() < b.sort_key());

        // same next time: lower priority wins
        let a = staker_with(10, StakerPriority::PrimaryNetworkValidatorPending, 0xFF);
        let b = staker_with(10, StakerPriority::SubnetValidatorCurrent, 0x00);
        assert!(a.sort_key() < b.sort_key());

        // same next time and priority: smaller tx id wins
        let a = staker_with(10, StakerPriority::SubnetValidatorCurrent, 0x01);
        let b = staker_with(10, StakerPriority::SubnetValidatorCurrent, 0x02);
        assert!(a.sort_key() < b.sort_key());
    }

    #[test]
    fn test_ordering_is_a_strict_total_order() {
        use rand::Rng;

        let priorities = [
            StakerPriority::PrimaryNetworkValidatorPending,
            StakerPriority::SubnetDelegatorPending,
            StakerPriority::SubnetValidatorCurrent,
            StakerPriority::PrimaryNetworkValidatorCurrent,
        ];
        let mut rng = rand::thread_rng();
        // small value domains so every tie-break level actually collides
        let stakers: Vec<Staker> = (0..48)
            .map(|_| {
                staker_with(
                    rng.gen_range(0u64..4),
                    priorities[rng.gen_range(0..priorities.len())],
                    rng.gen_range(0u8..4),
                )
            })
            .collect();

        for a in &stakers {
            for b in &stakers {
                let ab = a.sort_key() < b.sort_key();
                let ba = b.sort_key() < a.sort_key();
                // antisymmetry: both can never hold
                assert!(!(ab && ba));
                if !ab && !ba {
                    // no two distinct stakers may compare equal
                    assert_eq!(a.sort_key(), b.sort_key());
                    assert_eq!(a.next_time(), b.next_time());
                    assert_eq!(a.priority, b.priority);
                    assert_eq!(a.tx_id, b.tx_id);
                }
                for c in &stakers {
                    // transitivity
                    if ab && b.sort_key() < c.sort_key() {
                        assert!(a.sort_key() < c.sort_key());
                    }
                }
            }
        }
    }

    #[test]
    fn test_new_current_staker() {
        let stake = TestStake::validator(SubnetId::PRIMARY_NETWORK);
        let tx_id = TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]);
        let start = SeracTime::from_millis(100 * SECOND);
        let staker = Staker::new_current(tx_id, &stake, start, 777).unwrap();

        assert!(staker.is_current());
        assert_eq!(staker.tx_id, tx_id);
        assert_eq!(staker.weight, 2_000);
        assert_eq!(staker.potential_reward, 777);
        assert_eq!(staker.start_time(), start);
        // continuous staking: no fixed end until an explicit stop
        assert_eq!(staker.end_time(), None);
        assert_eq!(
            staker.next_time(),
            start.saturating_add(stake.staking_period)
        );
    }

    #[test]
    fn test_new_current_staker_propagates_key_error() {
        let mut stake = TestStake::validator(SubnetId::PRIMARY_NETWORK);
        stake.public_key = Err(StakersError::MissingPublicKey("missing".to_string()));
        let result = Staker::new_current(
            TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]),
            &stake,
            SeracTime::from_millis(0),
            0,
        );
        assert!(matches!(result, Err(StakersError::MissingPublicKey(_))));
    }

    #[test]
    fn test_new_pending_staker() {
        let subnet_id = SubnetId::from_bytes([4u8; SUBNET_ID_SIZE_BYTES]);
        let stake = TestStake::validator(subnet_id);
        let tx_id = TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]);
        let staker = Staker::new_pending(tx_id, &stake).unwrap();

        assert!(staker.is_pending());
        assert_eq!(staker.next_time(), stake.start_time);
        assert_eq!(staker.end_time(), Some(stake.end_time));
        assert_eq!(
            staker.staking_period(),
            stake.end_time.saturating_sub(stake.start_time)
        );
        assert_eq!(staker.potential_reward, 0);
    }

    #[test]
    fn test_shift_ahead() {
        let stake = TestStake::validator(SubnetId::PRIMARY_NETWORK);
        let start = SeracTime::from_millis(0);
        let mut staker = Staker::new_current(
            TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]),
            &stake,
            start,
            0,
        )
        .unwrap();
        let period = stake.staking_period;
        assert_eq!(staker.next_time(), SeracTime::from_millis(1_000 * SECOND));

        staker.shift_ahead();
        assert_eq!(staker.start_time(), SeracTime::from_millis(1_000 * SECOND));
        assert_eq!(staker.next_time(), SeracTime::from_millis(2_000 * SECOND));

        staker.shift_ahead();
        assert_eq!(staker.start_time(), SeracTime::from_millis(2_000 * SECOND));
        assert_eq!(staker.next_time(), SeracTime::from_millis(3_000 * SECOND));
        assert_eq!(staker.staking_period(), period);
    }

    #[test]
    fn test_shift_ahead_is_noop_for_pending() {
        let stake = TestStake::validator(SubnetId::PRIMARY_NETWORK);
        let mut staker =
            Staker::new_pending(TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]), &stake).unwrap();
        let before = staker.clone();
        staker.shift_ahead();
        assert_eq!(staker, before);
    }

    #[test]
    fn test_shift_ahead_is_noop_at_end_of_life() {
        let stake = TestStake::validator(SubnetId::PRIMARY_NETWORK);
        let mut staker = Staker::new_current(
            TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]),
            &stake,
            SeracTime::from_millis(0),
            0,
        )
        .unwrap();
        // stop at the end of the running period
        staker.mark_for_removal_before_time(SeracTime::from_millis(1));
        assert_eq!(staker.end_time(), Some(staker.next_time()));
        let before = staker.clone();
        staker.shift_ahead();
        assert_eq!(staker, before);
    }

    #[test]
    fn test_mark_for_removal_snaps_to_period_boundary() {
        let t = 7_000u64;
        let mut staker = Staker {
            tx_id: TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]),
            node_id: NodeId::from_bytes([1u8; NODE_ID_SIZE_BYTES]),
            public_key: None,
            subnet_id: SubnetId::PRIMARY_NETWORK,
            weight: 1,
            potential_reward: 0,
            timing: StakerTiming::Current {
                start: SeracTime::from_millis(t - 100),
                period: SeracTime::from_millis(100),
                end: Some(SeracTime::from_millis(t + 10_000)),
            },
            priority: StakerPriority::PrimaryNetworkValidatorCurrent,
        };
        assert_eq!(staker.next_time(), SeracTime::from_millis(t));

        // boundaries are t, t+100, t+200, t+300: the first one at or after
        // the requested stop is t+300
        staker.mark_for_removal_before_time(SeracTime::from_millis(t + 250));
        assert_eq!(staker.end_time(), Some(SeracTime::from_millis(t + 300)));

        // a stop later than the current end leaves the staker unchanged
        let before = staker.clone();
        staker.mark_for_removal_before_time(SeracTime::from_millis(t + 5_000));
        assert_eq!(staker, before);
    }

    #[test]
    fn test_earliest_stop_time() {
        let stake = TestStake::validator(SubnetId::PRIMARY_NETWORK);
        let staker = Staker::new_current(
            TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]),
            &stake,
            SeracTime::from_millis(0),
            0,
        )
        .unwrap();
        // primary network validator: one extra period of notice
        assert_eq!(
            staker.earliest_stop_time(1),
            staker
                .next_time()
                .saturating_add(staker.staking_period())
        );
        // the notice period is configurable
        assert_eq!(
            staker.earliest_stop_time(3),
            staker
                .next_time()
                .saturating_add(staker.staking_period().saturating_mul(3))
        );

        // subnet stakers stop at the next transition
        let subnet_stake = TestStake::validator(SubnetId::from_bytes([4u8; SUBNET_ID_SIZE_BYTES]));
        let subnet_staker = Staker::new_current(
            TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]),
            &subnet_stake,
            SeracTime::from_millis(0),
            0,
        )
        .unwrap();
        assert_eq!(subnet_staker.earliest_stop_time(1), subnet_staker.next_time());

        // never later than the end time
        let mut stopping = staker.clone();
        stopping.mark_for_removal_before_time(SeracTime::from_millis(1));
        assert_eq!(
            stopping.earliest_stop_time(1),
            stopping.end_time().unwrap()
        );
    }

    #[test]
    fn test_staker_serialization_roundtrip() {
        let serializer = StakerSerializer::new();
        let deserializer = StakerDeserializer::new();

        let stake = TestStake::validator(SubnetId::PRIMARY_NETWORK);
        let current = Staker::new_current(
            TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]),
            &stake,
            SeracTime::from_millis(42),
            123,
        )
        .unwrap();
        let mut pending =
            Staker::new_pending(TxId::from_bytes([10u8; TX_ID_SIZE_BYTES]), &stake).unwrap();
        pending.public_key = None;
        let mut stopping = current.clone();
        stopping.mark_for_removal_before_time(SeracTime::from_millis(50));

        for staker in [current, pending, stopping] {
            let mut buffer = Vec::new();
            serializer.serialize(&staker, &mut buffer).unwrap();
            let (rest, result) = deserializer
                .deserialize::<DeserializeError>(&buffer)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(result, staker);
        }
    }

    #[test]
    fn test_staker_deserialization_rejects_unknown_idents() {
        let serializer = StakerSerializer::new();
        let deserializer = StakerDeserializer::new();
        let stake = TestStake::validator(SubnetId::PRIMARY_NETWORK);
        let staker = Staker::new_current(
            TxId::from_bytes([9u8; TX_ID_SIZE_BYTES]),
            &stake,
            SeracTime::from_millis(42),
            0,
        )
        .unwrap();
        let mut buffer = Vec::new();
        serializer.serialize(&staker, &mut buffer).unwrap();

        // the encoding tail is: ident | start varint | period varint | end tag
        let varint_len = |time: SeracTime| {
            let mut tmp = Vec::new();
            SeracTimeSerializer::new().serialize(&time, &mut tmp).unwrap();
            tmp.len()
        };
        let ident_pos =
            buffer.len() - 1 - varint_len(staker.staking_period()) - varint_len(staker.start_time()) - 1;
        assert_eq!(buffer[ident_pos], 1u8);
        buffer[ident_pos] = 99u8;
        deserializer
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("unknown timing ident should fail");
    }
}
