// Copyright (c) 2025 SERAC LABS <info@serac.network>
//! Interface to the ordered key/value store backing the node state.
//!
//! Only the interface lives here: the production store worker wraps an
//! actual database engine and implements [`DbController`].

mod constants;
mod controller;
mod db_batch;
mod error;
mod settings;

pub use constants::*;
pub use controller::*;
pub use db_batch::*;
pub use error::*;
pub use settings::*;

#[cfg(feature = "test-exports")]
pub mod test_exports;
