//! Test utilities for topology integration tests

use meshtopo_core::{NodeAddress, Timestamp, TopologyConfig};
use meshtopo_topology::{AdvertisedParent, Clock, ManualClock, ParentTableStore};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a test-friendly subscriber once per process
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// EUI-64 style address whose last two bytes carry `id`
pub fn node(id: u16) -> NodeAddress {
    let [hi, lo] = id.to_be_bytes();
    NodeAddress::eui64([0x14, 0x15, 0x92, 0x00, 0x00, 0x00, hi, lo])
}

/// Advertised parents all confirmed at `timestamp`
pub fn parents(ids: &[u16], timestamp: Timestamp) -> Vec<AdvertisedParent> {
    ids.iter()
        .map(|id| AdvertisedParent::new(node(*id), timestamp))
        .collect()
}

/// Test fixture: a store driven by a manual clock
pub struct TestMesh {
    pub store: Arc<ParentTableStore>,
    pub clock: Arc<ManualClock>,
}

impl TestMesh {
    /// Create a store with the given TTL and clock start
    pub fn new(ttl_secs: u64, now: Timestamp) -> Self {
        let clock = Arc::new(ManualClock::new(now));
        let config = TopologyConfig {
            parent_ttl_secs: ttl_secs,
        };
        let store = Arc::new(ParentTableStore::with_clock(&config, clock.clone()));
        Self { store, clock }
    }

    /// Advertise `owner -> parent_ids` at the current clock time
    pub fn advertise(&self, owner: u16, parent_ids: &[u16]) {
        let now = self.clock.now();
        self.store
            .record_parent_advertisement(node(owner), parents(parent_ids, now))
            .unwrap();
    }
}

