//! Integration tests for the fetch → score → store pipeline.

mod mock_marketplace;
mod pipeline;
