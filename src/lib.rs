//! SPT Tweaks: host behavior overrides for an SPT server
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod error;
pub mod types;
pub mod rescale;
pub mod hooks;
pub mod host;
pub mod loot;
pub mod engine;
pub mod commands;
pub mod storage;
