//! Access strategies: how a storage is shared between callers.
//!
//! Every strategy implements [`Arena`], the one surface the registry and
//! the allocator adapter talk to:
//!
//! - **Exclusive:** the [`Storage`] itself. No synchronisation; it is
//!   `!Sync`, so the compiler rejects concurrent use.
//! - **Thread-local:** [`ThreadLocalStorage`] keeps one storage per calling
//!   thread, created lazily on that thread's first allocation.
//! - **Shared:** [`SharedStorage`] puts one storage behind a mutex. Every
//!   operation, introspection included, holds the lock for its duration.
//!
//! An access *tag* ([`ExclusiveAccess`], [`ThreadLocalAccess`],
//! [`SharedAccess`]) names a strategy at the type level so it can key a
//! registry entry.

use std::alloc::Layout;
use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

use parking_lot::Mutex;
use thread_local::ThreadLocal;
use tracing::debug;

use crate::config::{StorageConfig, DEFAULT_INLINE_SIZE};
use crate::error::ArenaError;
use crate::storage::{layout_for, ArenaStats, Storage};

/// The storage contract shared by every access strategy.
pub trait Arena {
    /// Create an empty arena that grows according to `config`.
    fn with_config(config: StorageConfig) -> Self
    where
        Self: Sized;

    /// Allocate memory for `layout`. See [`Storage::allocate`].
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError>;

    /// Allocate `size` bytes aligned to `align`, rejecting invalid
    /// alignments.
    fn allocate_bytes(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        self.allocate(layout_for(size, align)?)
    }

    /// No-op: arena memory is reclaimed only in bulk.
    fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}

    /// Rewind all cursors, keeping heap capacity.
    fn reset(&mut self);

    /// Rewind and free all heap blocks.
    fn release(&mut self);

    /// Snapshot of the usage counters.
    fn stats(&self) -> ArenaStats;

    /// Total bytes consumed.
    fn used(&self) -> usize {
        self.stats().used()
    }

    /// Bytes consumed from the inline buffer.
    fn fixed_used(&self) -> usize {
        self.stats().fixed_used
    }

    /// Bytes consumed from heap blocks.
    fn heap_used(&self) -> usize {
        self.stats().heap_used
    }

    /// Bytes left in the inline buffer.
    fn remaining(&self) -> usize {
        self.stats().fixed_remaining()
    }

    /// Bytes left in the inline buffer.
    fn fixed_remaining(&self) -> usize {
        self.stats().fixed_remaining()
    }

    /// Largest number of bytes the arena could ever hold.
    fn max_size(&self) -> usize {
        self.stats().max_size
    }
}

impl<const N: usize> Arena for Storage<N> {
    fn with_config(config: StorageConfig) -> Self {
        Storage::<N>::with_config(config)
    }

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        Storage::<N>::allocate(self, layout)
    }

    fn reset(&mut self) {
        Storage::<N>::reset(self);
    }

    fn release(&mut self) {
        Storage::<N>::release(self);
    }

    fn stats(&self) -> ArenaStats {
        Storage::<N>::stats(self)
    }

    fn used(&self) -> usize {
        Storage::<N>::used(self)
    }

    fn fixed_used(&self) -> usize {
        Storage::<N>::fixed_used(self)
    }

    fn heap_used(&self) -> usize {
        Storage::<N>::heap_used(self)
    }
}

/// One storage per thread.
///
/// Each thread that allocates gets its own [`Storage`], created on first
/// use. [`reset`](Arena::reset), [`release`](Arena::release) and
/// [`stats`](Arena::stats) see only the calling thread's instance.
/// Instances outlive their threads and are freed when this value drops.
/// Thread ids are recycled, so a new thread may pick up the instance (and
/// the usage) of one that has exited.
pub struct ThreadLocalStorage<const N: usize = DEFAULT_INLINE_SIZE> {
    config: StorageConfig,
    slots: ThreadLocal<RefCell<Storage<N>>>,
}

impl<const N: usize> ThreadLocalStorage<N> {
    /// Create with no per-thread instances yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            slots: ThreadLocal::new(),
        }
    }

    fn slot(&self) -> &RefCell<Storage<N>> {
        self.slots.get_or(|| {
            debug!(inline_capacity = N, "creating thread-local storage");
            RefCell::new(Storage::with_config(self.config))
        })
    }

    /// Bytes used across every thread's instance.
    pub fn total_used(&mut self) -> usize {
        self.slots.iter_mut().map(|slot| slot.get_mut().used()).sum()
    }
}

impl<const N: usize> Arena for ThreadLocalStorage<N> {
    fn with_config(config: StorageConfig) -> Self {
        Self::new(config)
    }

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        self.slot().borrow().allocate(layout)
    }

    fn reset(&mut self) {
        if let Some(slot) = self.slots.get() {
            slot.borrow_mut().reset();
        }
    }

    fn release(&mut self) {
        if let Some(slot) = self.slots.get() {
            slot.borrow_mut().release();
        }
    }

    fn stats(&self) -> ArenaStats {
        self.slots.get().map_or_else(
            || ArenaStats::fresh(N, &self.config),
            |slot| slot.borrow().stats(),
        )
    }
}

impl<const N: usize> fmt::Debug for ThreadLocalStorage<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadLocalStorage")
            .field("config", &self.config)
            .field("current_thread", &self.stats())
            .finish()
    }
}

/// One storage behind a mutex.
///
/// Allocation is fully serialised: there is no lock-free fast path. Bump
/// allocation is O(1) amortised, so the lock is held only briefly.
pub struct SharedStorage<const N: usize = DEFAULT_INLINE_SIZE> {
    inner: Mutex<Storage<N>>,
}

impl<const N: usize> SharedStorage<N> {
    /// Wrap a fresh storage built from `config`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            inner: Mutex::new(Storage::with_config(config)),
        }
    }

    /// Run `f` with the lock held, e.g. to make several allocations as one
    /// critical section.
    pub fn with_storage<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Storage<N>) -> T,
    {
        f(&self.inner.lock())
    }
}

impl<const N: usize> Arena for SharedStorage<N> {
    fn with_config(config: StorageConfig) -> Self {
        Self::new(config)
    }

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        self.inner.lock().allocate(layout)
    }

    fn reset(&mut self) {
        self.inner.lock().reset();
    }

    fn release(&mut self) {
        self.inner.lock().release();
    }

    fn stats(&self) -> ArenaStats {
        self.inner.lock().stats()
    }
}

impl<const N: usize> fmt::Debug for SharedStorage<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStorage")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Runtime name of an access strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Unsynchronised, single-threaded.
    Exclusive,
    /// One storage per thread.
    ThreadLocal,
    /// One mutex-guarded storage.
    Shared,
}

/// Type-level access tag selecting an [`Arena`] implementation.
///
/// Tags are never instantiated; they only key registry entries and
/// parameterise allocators.
pub trait Access: 'static {
    /// The strategy that guards storages with this tag.
    type Arena: Arena + Send + fmt::Debug + 'static;

    /// Runtime name of the strategy.
    const KIND: AccessKind;
}

/// Tag for [`Storage`] used without synchronisation.
///
/// `N` is the inline capacity of the storage, so one region can keep
/// separate arenas of different inline sizes.
#[derive(Debug)]
pub enum ExclusiveAccess<const N: usize = DEFAULT_INLINE_SIZE> {}

/// Tag for [`ThreadLocalStorage`] with `N` bytes inline per thread.
#[derive(Debug)]
pub enum ThreadLocalAccess<const N: usize = DEFAULT_INLINE_SIZE> {}

/// Tag for [`SharedStorage`] with `N` bytes inline.
#[derive(Debug)]
pub enum SharedAccess<const N: usize = DEFAULT_INLINE_SIZE> {}

impl<const N: usize> Access for ExclusiveAccess<N> {
    type Arena = Storage<N>;
    const KIND: AccessKind = AccessKind::Exclusive;
}

impl<const N: usize> Access for ThreadLocalAccess<N> {
    type Arena = ThreadLocalStorage<N>;
    const KIND: AccessKind = AccessKind::ThreadLocal;
}

impl<const N: usize> Access for SharedAccess<N> {
    type Arena = SharedStorage<N>;
    const KIND: AccessKind = AccessKind::Shared;
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn config() -> StorageConfig {
        StorageConfig::new().with_min_heap_increment(512)
    }

    fn exercise<A: Arena>(arena: &mut A) {
        arena.allocate_bytes(24, 8).unwrap();
        assert_eq!(arena.fixed_used(), 24);
        arena.allocate_bytes(1000, 8).unwrap();
        assert_eq!(arena.heap_used(), 1000);
        assert_eq!(arena.used(), 1024);
        assert_eq!(arena.remaining(), 64 - 24);

        arena.reset();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.stats().block_count, 1);

        arena.release();
        assert_eq!(arena.stats().block_count, 0);
        assert!(arena.allocate_bytes(8, 3).is_err());
    }

    #[test]
    fn every_strategy_has_the_same_surface() {
        exercise(&mut Storage::<64>::with_config(config()));
        exercise(&mut ThreadLocalStorage::<64>::with_config(config()));
        exercise(&mut SharedStorage::<64>::with_config(config()));
    }

    #[test]
    fn thread_local_instances_are_per_thread() {
        let mut arena = ThreadLocalStorage::<64>::new(config());
        arena.allocate_bytes(10, 1).unwrap();

        thread::scope(|s| {
            s.spawn(|| {
                assert_eq!(arena.used(), 0);
                arena.allocate_bytes(50, 1).unwrap();
                assert_eq!(arena.used(), 50);
            });
        });

        assert_eq!(arena.used(), 10);
        assert_eq!(arena.total_used(), 60);

        arena.reset();
        assert_eq!(arena.used(), 0);
        // The other thread's instance is untouched.
        assert_eq!(arena.total_used(), 50);
    }

    #[test]
    fn thread_local_stats_without_allocation_are_fresh() {
        let arena = ThreadLocalStorage::<64>::new(config());
        assert_eq!(arena.stats(), ArenaStats::fresh(64, &config()));
    }

    #[test]
    fn shared_storage_serialises_concurrent_allocations() {
        let arena = SharedStorage::<256>::new(config());
        let mut addrs: Vec<usize> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        (0..100)
                            .map(|_| arena.allocate_bytes(16, 16).unwrap().as_ptr() as usize)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        assert_eq!(arena.used(), 4 * 100 * 16);
        addrs.sort_unstable();
        for pair in addrs.windows(2) {
            assert!(pair[1] - pair[0] >= 16);
        }
    }

    #[test]
    fn with_storage_holds_one_lock_for_a_batch() {
        let arena = SharedStorage::<64>::new(config());
        let (a, b) = arena.with_storage(|storage| {
            let a = storage.allocate_bytes(8, 8).unwrap();
            let b = storage.allocate_bytes(8, 8).unwrap();
            (a, b)
        });
        assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 8);
    }

    #[test]
    fn access_kinds_match_tags() {
        assert_eq!(<ExclusiveAccess>::KIND, AccessKind::Exclusive);
        assert_eq!(<ThreadLocalAccess>::KIND, AccessKind::ThreadLocal);
        assert_eq!(<SharedAccess>::KIND, AccessKind::Shared);
        assert_eq!(<SharedAccess<64>>::KIND, AccessKind::Shared);
    }
}
