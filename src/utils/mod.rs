//! Shared helpers.

pub mod stats;
