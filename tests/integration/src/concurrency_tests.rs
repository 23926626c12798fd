//! Multi-threaded ingestion and read consistency

use crate::test_utils::{init_tracing, node, parents, TestMesh};
use meshtopo_topology::{resolve_source_route, SourceRouteResolver};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

const TTL: u64 = 70;
const NOW: u64 = 1_000;

#[test]
fn test_concurrent_distinct_owners_lose_no_updates() {
    init_tracing();
    let mesh = TestMesh::new(TTL, NOW);
    let owners: u16 = 64;
    let barrier = Arc::new(Barrier::new(owners as usize));

    let handles: Vec<_> = (1..=owners)
        .map(|owner| {
            let store = mesh.store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                // Owner N advertises N % 4 + 1 distinct parents.
                let count = owner % 4 + 1;
                let ids: Vec<u16> = (0..count).map(|i| 1_000 + owner * 10 + i).collect();
                barrier.wait();
                store
                    .record_parent_advertisement(node(owner), parents(&ids, NOW))
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let table = mesh.store.snapshot_parents().unwrap();
    assert_eq!(table.len(), owners as usize);
    for owner in 1..=owners {
        let record = table.get(&node(owner)).unwrap();
        assert_eq!(record.len(), (owner % 4 + 1) as usize);
    }
}

#[test]
fn test_concurrent_refreshes_of_one_owner_never_duplicate() {
    init_tracing();
    let mesh = TestMesh::new(TTL, NOW);
    let writers = 16;
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|writer| {
            let store = mesh.store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for round in 0..50u64 {
                    let ts = NOW - 50 + round + writer as u64;
                    store
                        .record_parent_advertisement(node(1), parents(&[2, 3, 4], ts))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let table = mesh.store.snapshot_parents().unwrap();
    let record = table.get(&node(1)).unwrap();
    assert_eq!(record.len(), 3);

    let distinct: HashSet<_> = record.parents.iter().map(|p| &p.parent_address).collect();
    assert_eq!(distinct.len(), 3);
    assert_eq!(record.preferred_parent(), Some(&node(2)));

    // The last advertisement applied wins, and it is applied whole.
    let oldest = NOW - 50;
    let newest = NOW - 50 + 49 + (writers as u64 - 1);
    let last_seen = record.parents[0].last_seen;
    assert!((oldest..=newest).contains(&last_seen));
    assert!(record.parents.iter().all(|p| p.last_seen == last_seen));
}

#[test]
fn test_readers_see_whole_advertisements_only() {
    init_tracing();
    let mesh = TestMesh::new(TTL, NOW);
    let rounds = 200u16;

    let writer = {
        let store = mesh.store.clone();
        thread::spawn(move || {
            for owner in 1..=rounds {
                // Every advertisement carries exactly three parents.
                let ids = [owner + 1_000, owner + 2_000, owner + 3_000];
                store
                    .record_parent_advertisement(node(owner), parents(&ids, NOW))
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = mesh.store.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let table = store.snapshot_parents().unwrap();
                    for record in table.records() {
                        assert_eq!(record.len(), 3, "torn record for {}", record.owner);
                    }
                    let view = table.graph_view();
                    assert_eq!(view.edges.len(), table.len() * 3);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(mesh.store.stats().unwrap().records, rounds as usize);
}

#[test]
fn test_resolution_runs_against_its_snapshot() {
    init_tracing();
    let mesh = TestMesh::new(TTL, NOW);
    for id in 1..100u16 {
        mesh.advertise(id, &[id + 1]);
    }

    let snapshot = mesh.store.snapshot_parents().unwrap();
    let resolver = SourceRouteResolver::new(mesh.store.clone());

    let rewirer = {
        let store = mesh.store.clone();
        thread::spawn(move || {
            // Close a loop back to node 1 while routes are being resolved.
            store
                .record_parent_advertisement(node(100), parents(&[1], NOW))
                .unwrap();
        })
    };

    for _ in 0..20 {
        let route = resolver.resolve(&node(1)).unwrap();
        let distinct: HashSet<_> = route.iter().collect();
        assert_eq!(distinct.len(), route.len());
        assert_eq!(route.first(), Some(&node(1)));
        assert_eq!(route.len(), 100);
    }
    rewirer.join().unwrap();

    let frozen = resolve_source_route(&node(1), &snapshot);
    assert_eq!(frozen.len(), 100);
    assert_eq!(frozen.last(), Some(&node(100)));
}

#[test]
fn test_eviction_concurrent_with_ingest() {
    init_tracing();
    let mesh = TestMesh::new(TTL, NOW - 100);
    for id in 1..=50u16 {
        mesh.advertise(id, &[500]);
    }
    assert_eq!(mesh.store.stats().unwrap().records, 50);

    // Every seeded record is now past its TTL.
    mesh.clock.set(NOW);

    let ingest = {
        let store = mesh.store.clone();
        thread::spawn(move || {
            for id in 100..150u16 {
                store
                    .record_parent_advertisement(node(id), parents(&[500], NOW))
                    .unwrap();
            }
        })
    };
    let sweeper = {
        let store = mesh.store.clone();
        thread::spawn(move || {
            let mut records_removed = 0;
            for _ in 0..50 {
                records_removed += store.evict_stale(NOW).unwrap().records_removed;
            }
            records_removed
        })
    };

    ingest.join().unwrap();
    // Ingest only sweeps its own owners, so the seeded records fell to the sweeper.
    assert_eq!(sweeper.join().unwrap(), 50);

    let table = mesh.store.snapshot_parents().unwrap();
    assert_eq!(table.len(), 50);
    for id in 1..=50u16 {
        assert!(!table.contains(&node(id)));
    }
    for id in 100..150u16 {
        assert_eq!(table.get(&node(id)).unwrap().parents[0].last_seen, NOW);
    }
}
