// Copyright (c) 2025 SERAC LABS <info@serac.network>
//! Test exports: an in-memory store controller for unit tests.

mod memory_db;

pub use memory_db::*;
