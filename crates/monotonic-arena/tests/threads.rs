//! Integration test: thread-local and shared access across worker threads.
//!
//! Thread-local regions give every worker its own storage behind one
//! allocator identity. Shared regions serialise every call on a mutex, so
//! concurrent allocations must come back disjoint and fully accounted.

use std::sync::Barrier;
use std::thread;

use allocator_api2::vec::Vec;
use monotonic_arena::{Arena, Registry, SharedAccess, ThreadLocalAccess};
use monotonic_test_utils::{assert_disjoint, init_tracing, Worker};

const THREADS: usize = 4;

#[test]
fn thread_local_workers_see_only_their_own_usage() {
    init_tracing();
    let registry = Registry::new();
    let alloc = registry.allocator::<u64, Worker, ThreadLocalAccess>();
    // Thread ids are recycled on exit; keep every worker alive until all
    // have measured so none inherits another's storage.
    let barrier = &Barrier::new(THREADS);

    let per_thread: std::vec::Vec<(usize, usize)> = thread::scope(|s| {
        let handles: std::vec::Vec<_> = (1..=THREADS)
            .map(|t| {
                s.spawn(move || {
                    let n = t * 100;
                    let mut v = Vec::with_capacity_in(n, alloc);
                    v.extend((0..n as u64).map(|x| x * 2));
                    assert_eq!(v.iter().sum::<u64>(), (n as u64) * (n as u64 - 1));
                    let used = alloc.stats().used();
                    barrier.wait();
                    (n * 8, used)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (expected, used) in per_thread {
        assert_eq!(used, expected);
    }
    // The spawning thread never allocated.
    assert_eq!(alloc.stats().used(), 0);
}

#[test]
fn thread_local_identity_is_shared_by_all_workers() {
    let registry = Registry::new();
    let alloc = registry.allocator::<u8, Worker, ThreadLocalAccess>();
    let ids: std::vec::Vec<*const ()> = thread::scope(|s| {
        (0..THREADS)
            .map(|_| s.spawn(move || alloc.storage_id() as usize))
            .collect::<std::vec::Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as *const ())
            .collect()
    });
    assert!(ids.iter().all(|&id| id == alloc.storage_id()));
}

#[test]
fn shared_region_hands_out_disjoint_blocks_under_contention() {
    init_tracing();
    let registry = Registry::new();
    let arena = registry.arena::<Worker, SharedAccess>();
    const PER_THREAD: usize = 1000;

    let addresses: std::vec::Vec<usize> = thread::scope(|s| {
        let handles: std::vec::Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| arena.allocate_bytes(16, 16).unwrap().as_ptr() as usize)
                        .collect::<std::vec::Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let mut sorted = addresses.clone();
    sorted.sort_unstable();
    for pair in sorted.windows(2) {
        assert_disjoint(pair[0], 16, pair[1], 16);
    }
    assert_eq!(arena.used(), THREADS * PER_THREAD * 16);
}

#[test]
fn shared_containers_built_on_workers_come_back_intact() {
    let mut registry = Registry::new();
    {
        let alloc = registry.allocator::<u32, Worker, SharedAccess>();
        let vectors = thread::scope(|s| {
            let handles: std::vec::Vec<_> = (0..THREADS as u32)
                .map(|t| {
                    s.spawn(move || {
                        let mut v = Vec::new_in(alloc);
                        v.extend(t * 10..t * 10 + 10);
                        v
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<std::vec::Vec<_>>()
        });

        for (t, v) in vectors.iter().enumerate() {
            assert_eq!(v.first().copied(), Some(t as u32 * 10));
            assert_eq!(v.len(), 10);
            assert!(*v.allocator() == alloc);
        }
    }
    registry.release::<Worker, SharedAccess>();
    assert_eq!(registry.stats::<Worker, SharedAccess>().unwrap().used(), 0);
}
