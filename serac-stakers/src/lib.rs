// Copyright (c) 2025 SERAC LABS <info@serac.network>
//! Definition and exports of the validator staker set ledger.
//!
//! Tracks which nodes are authorized to vote in consensus, with what
//! weight, over what time window, and persists a compact replayable
//! history of weight changes keyed by block height.

#![warn(missing_docs)]

mod changes;
mod config;
mod controller_traits;
mod diff;
mod error;
mod iterator;
mod ledger;
mod priorities;
mod staker;

pub use changes::*;
pub use config::*;
pub use controller_traits::*;
pub use diff::*;
pub use error::*;
pub use iterator::*;
pub use ledger::*;
pub use priorities::*;
pub use staker::*;
