//! FLIPSCOUT — Marketplace listing scanner and flip-deal tracker
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod market;
pub mod analysis;
pub mod engine;
pub mod storage;
