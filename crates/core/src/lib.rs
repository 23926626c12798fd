//! Core functionality for the meshtopo mesh topology tracker.
//!
//! This crate provides the node address type, configuration, logging
//! setup and error types shared by the topology store and its tools.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{Config, LoggingConfig, TopologyConfig, DEFAULT_PARENT_TTL_SECS};
pub use error::{Error, Result};
pub use types::{NodeAddress, Timestamp, EUI64_LEN};
