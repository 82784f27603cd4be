//! regionpool CLI library: scenario runners for the region arena.

pub mod app;
pub mod config;
