//! Test fixtures for monotonic allocator development.
//!
//! Region marker types, a drop-counting value for destructor checks, a
//! tracing hook for test output and an alignment assertion. This crate does
//! not depend on `monotonic-arena`, so the arena's own unit tests can use it.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::Level;

/// Region tag for tests that need one region.
pub enum RegionA {}

/// A second region tag, distinct from [`RegionA`].
pub enum RegionB {}

/// Region tag used by tests that move allocators across threads.
pub enum Worker {}

/// Shared counter of [`Tracked`] values dropped.
#[derive(Clone, Debug, Default)]
pub struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A value that bumps this counter when dropped.
    pub fn track<T>(&self, value: T) -> Tracked<T> {
        Tracked {
            value,
            counter: self.clone(),
        }
    }

    /// Number of tracked values dropped so far.
    pub fn drops(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A value whose destructor is counted.
#[derive(Debug)]
pub struct Tracked<T> {
    pub value: T,
    counter: DropCounter,
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.counter.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Install a fmt subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs. Honours
/// `MONOTONIC_LOG=trace|debug|info|warn|error`, defaulting to `debug`.
pub fn init_tracing() {
    let level = std::env::var("MONOTONIC_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::DEBUG);
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(level)
        .try_init();
}

/// Assert that `ptr` is aligned to `align`.
#[track_caller]
pub fn assert_aligned<T: ?Sized>(ptr: *const T, align: usize) {
    let addr = ptr.cast::<u8>() as usize;
    assert_eq!(
        addr % align,
        0,
        "pointer {addr:#x} is not aligned to {align}"
    );
}

/// Assert that the byte ranges `[a, a + a_len)` and `[b, b + b_len)` are
/// disjoint. Empty ranges never overlap.
#[track_caller]
pub fn assert_disjoint(a: usize, a_len: usize, b: usize, b_len: usize) {
    if a_len == 0 || b_len == 0 {
        return;
    }
    assert!(
        a + a_len <= b || b + b_len <= a,
        "ranges {a:#x}+{a_len} and {b:#x}+{b_len} overlap"
    );
}
