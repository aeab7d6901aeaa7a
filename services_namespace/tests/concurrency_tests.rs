//! Readers running alongside a writer always see complete mutations

use services_namespace::{MemoryNamesystem, NamesystemConfig, SharedNamesystem};
use std::thread;

#[test]
fn test_concurrent_readers_see_consistent_listings() {
    let shared = SharedNamesystem::new(
        MemoryNamesystem::in_memory(&NamesystemConfig::default()).unwrap(),
    );
    for i in 0..8 {
        shared.create_file(&format!("/dir/f{}", i), None).unwrap();
    }

    let writer = {
        let shared = shared.clone();
        thread::spawn(move || {
            for round in 0..50 {
                let policy = if round % 2 == 0 { "COLD" } else { "WARM" };
                shared.set_storage_policy("/dir", policy).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let listing = shared.list_status("/dir").unwrap();
                    assert_eq!(listing.len(), 8);
                    // Every child inherits the same policy at any instant
                    let first = listing[0].storage_policy;
                    assert!(listing.iter().all(|s| s.storage_policy == first));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    let listing = shared.list_status("/dir").unwrap();
    assert!(listing.iter().all(|s| s.storage_policy_id() == 8));
}

#[test]
fn test_read_guard_spans_several_reads() {
    let shared = SharedNamesystem::new(
        MemoryNamesystem::in_memory(&NamesystemConfig::default()).unwrap(),
    );
    shared.create_file("/a/f", None).unwrap();

    let guard = shared.read();
    let dir = guard.file_info("/a").unwrap();
    let listing = guard.list_status("/a").unwrap();
    assert_eq!(dir.children_num, listing.len());
}
