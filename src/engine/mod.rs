//! Core engine — the fetch → score → store pipeline.

pub mod feed;
pub mod analyzer;
pub mod cycle;
