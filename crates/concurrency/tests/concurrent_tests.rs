//! Concurrent/Multi-threaded Tests for ban-concurrency
//!
//! These tests use real threads to exercise:
//!
//! 1. **Concurrent Commits** - Many threads committing disjoint keys
//! 2. **Version Monotonicity** - Commit versions are unique and increasing
//! 3. **First-Committer-Wins** - Read-set and CAS conflicts under real races
//! 4. **Atomicity** - A rejected transaction applies none of its writes

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use ban_concurrency::{TransactionContext, TransactionManager};
use ban_core::{EntityId, EntityKind, EntityRef, Key, Storage};
use ban_storage::UnifiedStore;
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn create_shared_env() -> (Arc<UnifiedStore>, Arc<TransactionManager>) {
    let store = Arc::new(UnifiedStore::new());
    let manager = Arc::new(TransactionManager::new(store.current_version()));
    (store, manager)
}

fn begin(store: &UnifiedStore, manager: &TransactionManager) -> TransactionContext {
    TransactionContext::with_snapshot(manager.next_txn_id(), Box::new(store.create_snapshot()))
}

// ============================================================================
// Concurrent Commits
// ============================================================================

#[test]
fn test_disjoint_commits_all_succeed_with_unique_versions() {
    let (store, manager) = create_shared_env();
    let versions = Arc::new(Mutex::new(Vec::new()));
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let store = Arc::clone(&store);
            let manager = Arc::clone(&manager);
            let versions = Arc::clone(&versions);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut txn = begin(&store, &manager);
                let key = Key::row(EntityKind::Contact, EntityId::new());
                txn.cas(key, 0, json!({ "writer": i })).unwrap();
                let version = manager.commit(&mut txn, store.as_ref()).unwrap();
                versions.lock().push(version);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let versions = versions.lock();
    let unique: HashSet<u64> = versions.iter().copied().collect();
    assert_eq!(unique.len(), threads);
    assert_eq!(*versions.iter().max().unwrap(), threads as u64);
    assert_eq!(store.current_version(), threads as u64);
    assert_eq!(store.len(), threads);
}

// ============================================================================
// First-Committer-Wins
// ============================================================================

#[test]
fn test_read_modify_write_race_on_one_row() {
    let (store, manager) = create_shared_env();
    let row = EntityRef::new(EntityKind::Street, EntityId::new());
    let mut seed = begin(&store, &manager);
    seed.put(row.row_key(), json!({ "version": 1 })).unwrap();
    manager.commit(&mut seed, store.as_ref()).unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let store = Arc::clone(&store);
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut txn = begin(&store, &manager);
                let (_, seen) = txn.get_versioned(&row.row_key()).unwrap().unwrap();
                txn.cas(row.row_key(), seen, json!({ "version": 2, "writer": i }))
                    .unwrap();
                txn.cas(row.ledger_key(2), 0, json!({ "writer": i })).unwrap();
                barrier.wait();
                manager.commit(&mut txn, store.as_ref()).is_ok()
            })
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(wins, 1);

    // The winner's row and ledger entry were written together
    let stored_row = store.get(&row.row_key()).unwrap().unwrap();
    let stored_entry = store.get(&row.ledger_key(2)).unwrap().unwrap();
    assert_eq!(stored_row.value["writer"], stored_entry.value["writer"]);
    assert_eq!(stored_row.version, stored_entry.version);
}

#[test]
fn test_rejected_transaction_applies_nothing() {
    let (store, manager) = create_shared_env();
    let contested = Key::unique(EntityKind::HouseNumber, EntityId::new(), "1|");
    let bystander = Key::row(EntityKind::HouseNumber, EntityId::new());

    let mut winner = begin(&store, &manager);
    let mut loser = begin(&store, &manager);
    winner.cas(contested.clone(), 0, json!("w")).unwrap();
    loser.cas(contested.clone(), 0, json!("l")).unwrap();
    loser.put(bystander.clone(), json!("l")).unwrap();

    manager.commit(&mut winner, store.as_ref()).unwrap();
    assert!(manager.commit(&mut loser, store.as_ref()).is_err());
    assert!(loser.is_aborted());
    assert!(store.get(&bystander).unwrap().is_none());
    assert_eq!(store.get(&contested).unwrap().unwrap().value, json!("w"));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_read_your_writes(values in proptest::collection::vec(any::<i64>(), 1..20)) {
        let (store, manager) = create_shared_env();
        let key = Key::row(EntityKind::Position, EntityId::new());
        let mut txn = begin(&store, &manager);
        for v in &values {
            txn.put(key.clone(), json!(v)).unwrap();
            prop_assert_eq!(txn.get(&key).unwrap(), Some(json!(v)));
        }
        txn.delete(key.clone()).unwrap();
        prop_assert_eq!(txn.get(&key).unwrap(), None);
    }

    #[test]
    fn prop_sequential_commits_are_monotonic(n in 1usize..30) {
        let (store, manager) = create_shared_env();
        let mut last = 0;
        for _ in 0..n {
            let mut txn = begin(&store, &manager);
            txn.put(Key::row(EntityKind::Contact, EntityId::new()), json!(null)).unwrap();
            let version = manager.commit(&mut txn, store.as_ref()).unwrap();
            prop_assert!(version > last);
            last = version;
        }
        prop_assert_eq!(store.current_version(), n as u64);
    }
}
