//! Integration tests for the topology store
//!
//! This test suite validates:
//! - Concurrent ingestion and snapshot consistency across threads
//! - End-to-end ingest → evict → graph → route scenarios
//! - Configuration flowing from the core crate into the store
//! - The background sweeper running next to live ingestion

pub mod test_utils;

#[cfg(test)]
mod concurrency_tests;
