// Copyright (c) 2025 SERAC LABS <info@serac.network>

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

/// Tag disambiguating stakers with the same transition time.
///
/// Stakers created by the same transaction kind share a priority, so they
/// group together in the ordered sets; pending-set priorities are all
/// strictly lower than current-set priorities, so the two populations never
/// interleave even at identical timestamps. The discriminant values are
/// part of the persisted staker encoding and must not be reordered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum StakerPriority {
    /// validator waiting to enter the primary network validator set
    PrimaryNetworkValidatorPending = 0,
    /// delegator waiting to enter the primary network validator set
    PrimaryNetworkDelegatorPending = 1,
    /// validator waiting to enter a subnet validator set
    SubnetValidatorPending = 2,
    /// delegator waiting to enter a subnet validator set
    SubnetDelegatorPending = 3,
    /// active subnet validator
    SubnetValidatorCurrent = 4,
    /// active subnet delegator
    SubnetDelegatorCurrent = 5,
    /// active primary network delegator
    PrimaryNetworkDelegatorCurrent = 6,
    /// active primary network validator
    PrimaryNetworkValidatorCurrent = 7,
}

impl StakerPriority {
    /// Whether this priority belongs to the pending set
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            StakerPriority::PrimaryNetworkValidatorPending
                | StakerPriority::PrimaryNetworkDelegatorPending
                | StakerPriority::SubnetValidatorPending
                | StakerPriority::SubnetDelegatorPending
        )
    }

    /// Whether this priority belongs to the current set
    pub fn is_current(&self) -> bool {
        !self.is_pending()
    }

    /// Whether this priority tags a validator
    pub fn is_validator(&self) -> bool {
        matches!(
            self,
            StakerPriority::PrimaryNetworkValidatorPending
                | StakerPriority::SubnetValidatorPending
                | StakerPriority::SubnetValidatorCurrent
                | StakerPriority::PrimaryNetworkValidatorCurrent
        )
    }

    /// Whether this priority tags a delegator
    pub fn is_delegator(&self) -> bool {
        !self.is_validator()
    }
}
