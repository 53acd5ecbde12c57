//! Shared utilities for streamflate integration tests

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod test_utils;

pub use test_utils::{generate_test_data, FailingSink, TestDataPattern, TrickleSink};
