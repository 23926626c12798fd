//! Parent Table - per-node candidate parents with freshness tracking
//!
//! Every node periodically advertises the parents it could forward through
//! toward the root. The store merges those advertisements, ages entries out
//! after the configured TTL and hands out consistent point-in-time copies
//! for graph rendering and source-route resolution.

use meshtopo_core::{NodeAddress, Timestamp, TopologyConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{TopologyError, TopologyResult};
use crate::graph::GraphView;

/// One parent as carried by an advertisement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisedParent {
    /// Advertised parent address
    pub address: NodeAddress,
    /// When the owner (re)confirmed this parent
    pub timestamp: Timestamp,
}

impl AdvertisedParent {
    /// Create an advertised parent
    pub fn new(address: impl Into<NodeAddress>, timestamp: Timestamp) -> Self {
        Self {
            address: address.into(),
            timestamp,
        }
    }
}

/// Candidate next hop recorded for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentEntry {
    /// Parent node address
    pub parent_address: NodeAddress,
    /// Last time the parent was confirmed
    pub last_seen: Timestamp,
}

/// All parents currently known for one owner.
///
/// Entries keep advertisement order; index 0 is the preferred parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRecord {
    /// Node that advertised these parents
    pub owner: NodeAddress,
    /// Parents in advertisement order, unique by address
    pub parents: Vec<ParentEntry>,
}

/// Entries touched by merging one advertisement into a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    /// Existing parents whose `last_seen` was refreshed
    pub refreshed: usize,
    /// Parents appended to the record
    pub appended: usize,
}

/// Returns true when an entry last seen at `last_seen` has outlived `ttl_secs` at `now`.
///
/// Timestamps in the future relative to `now` are never stale.
pub fn is_stale(last_seen: Timestamp, now: Timestamp, ttl_secs: u64) -> bool {
    now.saturating_sub(last_seen) > ttl_secs
}

impl ParentRecord {
    /// Create an empty record for `owner`
    pub fn new(owner: NodeAddress) -> Self {
        Self {
            owner,
            parents: Vec::new(),
        }
    }

    /// Create a record holding `parents` in the given order, merged as one advertisement
    pub fn with_parents(owner: NodeAddress, parents: &[AdvertisedParent]) -> Self {
        let mut record = Self::new(owner);
        record.merge(parents);
        record
    }

    /// Preferred parent (first entry), if any
    pub fn preferred_parent(&self) -> Option<&NodeAddress> {
        self.parents.first().map(|entry| &entry.parent_address)
    }

    /// Look up the entry for a parent address
    pub fn get(&self, parent: &NodeAddress) -> Option<&ParentEntry> {
        self.parents.iter().find(|entry| &entry.parent_address == parent)
    }

    /// Number of parents
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// True when no parents remain
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Merge an advertisement: refresh known parents in place, append new ones.
    ///
    /// Parents missing from `advertised` are left alone. A refresh takes the
    /// delivered timestamp as is, so later deliveries win.
    pub fn merge(&mut self, advertised: &[AdvertisedParent]) -> MergeCounts {
        let mut counts = MergeCounts::default();

        for incoming in advertised {
            match self
                .parents
                .iter_mut()
                .find(|entry| entry.parent_address == incoming.address)
            {
                Some(entry) => {
                    entry.last_seen = incoming.timestamp;
                    counts.refreshed += 1;
                }
                None => {
                    self.parents.push(ParentEntry {
                        parent_address: incoming.address.clone(),
                        last_seen: incoming.timestamp,
                    });
                    counts.appended += 1;
                }
            }
        }

        counts
    }

    /// Drop entries older than `ttl_secs` at `now`, returning how many were removed
    pub fn evict_stale(&mut self, now: Timestamp, ttl_secs: u64) -> usize {
        let before = self.parents.len();
        self.parents
            .retain(|entry| !is_stale(entry.last_seen, now, ttl_secs));
        before - self.parents.len()
    }
}

/// Outcome of sweeping stale entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionReport {
    /// Parent entries removed
    pub entries_removed: usize,
    /// Records removed because their last entry went stale
    pub records_removed: usize,
}

impl EvictionReport {
    /// True when the sweep removed nothing
    pub fn is_empty(&self) -> bool {
        self.entries_removed == 0 && self.records_removed == 0
    }
}

/// Point-in-time mapping from node to its parent record.
///
/// Records are keyed in address order so everything derived from a table
/// (graph edges, iteration) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentTable {
    records: BTreeMap<NodeAddress, ParentRecord>,
}

impl ParentTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for its owner
    pub fn insert(&mut self, record: ParentRecord) -> Option<ParentRecord> {
        self.records.insert(record.owner.clone(), record)
    }

    /// Record for `owner`, if any
    pub fn get(&self, owner: &NodeAddress) -> Option<&ParentRecord> {
        self.records.get(owner)
    }

    /// True when `owner` has a record
    pub fn contains(&self, owner: &NodeAddress) -> bool {
        self.records.contains_key(owner)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no node has a record
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total parent entries across all records
    pub fn entry_count(&self) -> usize {
        self.records.values().map(ParentRecord::len).sum()
    }

    /// Records in owner address order
    pub fn records(&self) -> impl Iterator<Item = &ParentRecord> {
        self.records.values()
    }

    /// Derive the topology graph from this table
    pub fn graph_view(&self) -> GraphView {
        GraphView::from_table(self)
    }

    /// Remove stale entries from every record and drop records left empty
    pub fn evict_stale(&mut self, now: Timestamp, ttl_secs: u64) -> EvictionReport {
        let mut report = EvictionReport::default();

        self.records.retain(|_, record| {
            report.entries_removed += record.evict_stale(now, ttl_secs);
            if record.is_empty() {
                report.records_removed += 1;
                false
            } else {
                true
            }
        });

        report
    }

    fn get_mut(&mut self, owner: &NodeAddress) -> Option<&mut ParentRecord> {
        self.records.get_mut(owner)
    }

    fn entry(&mut self, owner: &NodeAddress) -> &mut ParentRecord {
        self.records
            .entry(owner.clone())
            .or_insert_with(|| ParentRecord::new(owner.clone()))
    }

    fn remove(&mut self, owner: &NodeAddress) -> Option<ParentRecord> {
        self.records.remove(owner)
    }
}

impl FromIterator<ParentRecord> for ParentTable {
    fn from_iter<I: IntoIterator<Item = ParentRecord>>(iter: I) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

/// What a single advertisement did to the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvertisementOutcome {
    /// A new record was created for the owner
    pub created: bool,
    /// Existing parents refreshed
    pub refreshed: usize,
    /// Parents appended
    pub appended: usize,
    /// Stale entries swept from the owner's record
    pub evicted: usize,
    /// Whether the owner has a record after the advertisement
    pub record_present: bool,
}

/// Table size after eviction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// Nodes with at least one live parent
    pub records: usize,
    /// Live parent entries
    pub entries: usize,
}

/// Shared, thread-safe owner of the parent table.
///
/// A single mutex guards the whole table: every advertisement merge, sweep
/// and snapshot copy runs under it, so readers never observe a partially
/// applied advertisement.
#[derive(Debug)]
pub struct ParentTableStore {
    table: Mutex<ParentTable>,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl ParentTableStore {
    /// Create a store using the wall clock
    pub fn new(config: &TopologyConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store reading "now" from `clock`
    pub fn with_clock(config: &TopologyConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(ParentTable::new()),
            ttl_secs: config.parent_ttl_secs,
            clock,
        }
    }

    /// Configured parent-entry TTL in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Merge one node's parent advertisement into the table.
    ///
    /// The owner's existing entries are swept for staleness first. Known
    /// parents are refreshed in place, unknown ones are appended, and parents
    /// absent from `advertised` are kept until they age out. An empty
    /// advertisement never creates a record.
    ///
    /// Null owner or parent addresses are rejected and leave the table unchanged.
    pub fn record_parent_advertisement(
        &self,
        owner: NodeAddress,
        advertised: Vec<AdvertisedParent>,
    ) -> TopologyResult<AdvertisementOutcome> {
        if let Err(e) = validate_advertisement(&owner, &advertised) {
            warn!(owner = %owner, error = %e, "Rejected parent advertisement");
            return Err(e);
        }

        let now = self.clock.now();
        let mut table = self.lock()?;
        let mut outcome = AdvertisementOutcome::default();

        if let Some(record) = table.get_mut(&owner) {
            outcome.evicted = record.evict_stale(now, self.ttl_secs);
            if record.is_empty() {
                table.remove(&owner);
            }
        }

        if !table.contains(&owner) {
            if advertised.is_empty() {
                debug!(owner = %owner, "Empty advertisement for unknown node");
                return Ok(outcome);
            }
            outcome.created = true;
        }

        let record = table.entry(&owner);
        let counts = record.merge(&advertised);
        outcome.refreshed = counts.refreshed;
        outcome.appended = counts.appended;

        // Entries that arrived already expired must not resurrect a record.
        outcome.evicted += record.evict_stale(now, self.ttl_secs);
        outcome.record_present = !record.is_empty();
        if !outcome.record_present {
            table.remove(&owner);
        }

        debug!(
            owner = %owner,
            created = outcome.created,
            refreshed = outcome.refreshed,
            appended = outcome.appended,
            evicted = outcome.evicted,
            "Recorded parent advertisement"
        );

        Ok(outcome)
    }

    /// Remove every entry older than the TTL at `now`, then any record left empty.
    pub fn evict_stale(&self, now: Timestamp) -> TopologyResult<EvictionReport> {
        let mut table = self.lock()?;
        let report = table.evict_stale(now, self.ttl_secs);

        if !report.is_empty() {
            info!(
                entries_removed = report.entries_removed,
                records_removed = report.records_removed,
                now,
                "Evicted stale parents"
            );
        }

        Ok(report)
    }

    /// Consistent copy of the table with stale entries evicted at the clock's now
    pub fn snapshot_parents(&self) -> TopologyResult<ParentTable> {
        let now = self.clock.now();
        let mut table = self.lock()?;
        table.evict_stale(now, self.ttl_secs);
        Ok(table.clone())
    }

    /// Topology graph of the current snapshot
    pub fn graph_view(&self) -> TopologyResult<GraphView> {
        Ok(self.snapshot_parents()?.graph_view())
    }

    /// Record and entry counts after eviction
    pub fn stats(&self) -> TopologyResult<TableStats> {
        let now = self.clock.now();
        let mut table = self.lock()?;
        table.evict_stale(now, self.ttl_secs);
        Ok(TableStats {
            records: table.len(),
            entries: table.entry_count(),
        })
    }

    /// Acquire the table, reporting poisoning to the caller.
    ///
    /// The poison flag is cleared so later operations run against the table
    /// as it was left; merges and sweeps never leave a record half-written.
    fn lock(&self) -> TopologyResult<MutexGuard<'_, ParentTable>> {
        self.table.lock().map_err(|e| {
            warn!(error = %e, "Parent table lock poisoned");
            self.table.clear_poison();
            TopologyError::LockPoisoned(e.to_string())
        })
    }
}

fn validate_advertisement(owner: &NodeAddress, advertised: &[AdvertisedParent]) -> TopologyResult<()> {
    if owner.is_empty() {
        return Err(TopologyError::InvalidAddress {
            role: "owner",
            reason: "zero-length address".to_string(),
        });
    }

    if let Some(index) = advertised.iter().position(|p| p.address.is_empty()) {
        return Err(TopologyError::InvalidAddress {
            role: "parent",
            reason: format!("zero-length address at position {} from {}", index, owner),
        });
    }

    Ok(())
}
