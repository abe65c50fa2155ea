//! The region registry.
//!
//! A [`Registry`] owns one arena per `(region tag, access tag)` pair and
//! creates it on first touch with the registry's [`StorageConfig`]. The key
//! is the pair of [`TypeId`]s, so two regions or two access strategies never
//! alias, and every allocator naming the same pair sees the same arena.
//!
//! Handing out `&A::Arena` from `&self` is what lets many allocators share
//! an arena at once. Rewinding is the opposite: [`Registry::reset`] and
//! [`Registry::release`] take `&mut self`, so they compile only once every
//! allocator and container borrowed from the registry is gone.
//!
//! Entries are kept in insertion order (`IndexMap`) and are never removed
//! while the registry lives; release frees an entry's heap blocks but keeps
//! the entry so its identity is stable.

#![allow(unsafe_code)]

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

use indexmap::IndexMap;
use tracing::debug;

use crate::access::{Access, AccessKind, Arena};
use crate::allocator::MonotonicAllocator;
use crate::config::StorageConfig;
use crate::error::ArenaError;
use crate::local::Local;
use crate::storage::ArenaStats;

/// The region used when no tag is given.
#[derive(Debug)]
pub enum DefaultRegion {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct RegionKey {
    region: TypeId,
    access: TypeId,
}

impl RegionKey {
    fn of<R: 'static, A: Access>() -> Self {
        Self {
            region: TypeId::of::<R>(),
            access: TypeId::of::<A>(),
        }
    }
}

/// Object-safe view of an arena, for operations over every entry.
trait DynArena: Send {
    fn as_any(&self) -> &dyn Any;
    fn reset(&mut self);
    fn release(&mut self);
    fn stats(&self) -> ArenaStats;
}

impl<T: Arena + Send + 'static> DynArena for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn reset(&mut self) {
        Arena::reset(self);
    }

    fn release(&mut self) {
        Arena::release(self);
    }

    fn stats(&self) -> ArenaStats {
        Arena::stats(self)
    }
}

struct Entry {
    region: &'static str,
    kind: AccessKind,
    /// Owned arena, held as a raw pointer so that moving the entry while
    /// the map grows never invalidates references handed out earlier.
    arena: NonNull<dyn DynArena>,
}

// SAFETY: the entry uniquely owns a `Send` arena.
unsafe impl Send for Entry {}

impl Entry {
    fn new<R: 'static, A: Access>(config: StorageConfig) -> Self {
        let arena: Box<dyn DynArena> = Box::new(<A::Arena as Arena>::with_config(config));
        Self {
            region: type_name::<R>(),
            kind: A::KIND,
            // SAFETY: `Box::into_raw` never returns null.
            arena: unsafe { NonNull::new_unchecked(Box::into_raw(arena)) },
        }
    }

    fn arena(&self) -> &dyn DynArena {
        // SAFETY: the box is live until the entry drops.
        unsafe { self.arena.as_ref() }
    }

    fn arena_mut(&mut self) -> &mut dyn DynArena {
        // SAFETY: live, and `&mut self` on the entry is only reachable
        // through `&mut Registry`, which excludes outstanding borrows.
        unsafe { self.arena.as_mut() }
    }
}

impl Drop for Entry {
    fn drop(&mut self) {
        // SAFETY: produced by `Box::into_raw` in `Entry::new` and freed once.
        drop(unsafe { Box::from_raw(self.arena.as_ptr()) });
    }
}

/// Owner of every region's arena.
///
/// The registry is `Send` but not `Sync`: it may move to another thread,
/// and the thread-local and shared strategies let allocators cross threads,
/// but lookups themselves happen on one thread at a time.
pub struct Registry {
    config: StorageConfig,
    entries: RefCell<IndexMap<RegionKey, Entry>>,
}

impl Registry {
    /// Create a registry whose arenas use the default config.
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
            entries: RefCell::new(IndexMap::new()),
        }
    }

    /// Create a registry whose arenas use `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(config: StorageConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            config,
            entries: RefCell::new(IndexMap::new()),
        })
    }

    /// The config new arenas are created with.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// The arena for region `R` under strategy `A`, created on first use.
    pub fn arena<R: 'static, A: Access>(&self) -> &A::Arena {
        let key = RegionKey::of::<R, A>();
        let ptr = {
            let mut entries = self.entries.borrow_mut();
            let entry = entries.entry(key).or_insert_with(|| {
                debug!(
                    region = type_name::<R>(),
                    access = ?A::KIND,
                    "creating region arena"
                );
                Entry::new::<R, A>(self.config)
            });
            entry.arena
        };
        // SAFETY: the pointee is owned by an entry that is neither removed
        // nor mutated while `&self` is borrowed; only `&mut self` methods
        // drop or rewind arenas.
        let arena = unsafe { &*ptr.as_ptr() };
        match arena.as_any().downcast_ref::<A::Arena>() {
            Some(arena) => arena,
            None => unreachable!("registry key pins the arena type"),
        }
    }

    /// An allocator for `T` bound to region `R` under strategy `A`.
    pub fn allocator<T, R: 'static, A: Access>(&self) -> MonotonicAllocator<'_, T, R, A> {
        MonotonicAllocator::new(self.arena::<R, A>())
    }

    /// Whether the arena for `(R, A)` has been created.
    pub fn contains<R: 'static, A: Access>(&self) -> bool {
        self.entries
            .borrow()
            .contains_key(&RegionKey::of::<R, A>())
    }

    /// Number of arenas created so far.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no arena has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usage of the `(R, A)` arena, or `None` if it was never touched.
    pub fn stats<R: 'static, A: Access>(&self) -> Option<ArenaStats> {
        self.entries
            .borrow()
            .get(&RegionKey::of::<R, A>())
            .map(|entry| entry.arena().stats())
    }

    /// Rewind the `(R, A)` arena, keeping its heap capacity. A no-op if the
    /// arena does not exist.
    pub fn reset<R: 'static, A: Access>(&mut self) {
        if let Some(entry) = self.entries.get_mut().get_mut(&RegionKey::of::<R, A>()) {
            entry.arena_mut().reset();
        }
    }

    /// Rewind the `(R, A)` arena and free its heap blocks. The entry itself
    /// stays registered.
    pub fn release<R: 'static, A: Access>(&mut self) {
        if let Some(entry) = self.entries.get_mut().get_mut(&RegionKey::of::<R, A>()) {
            debug!(region = entry.region, access = ?entry.kind, "releasing region arena");
            entry.arena_mut().release();
        }
    }

    /// Reset every arena.
    pub fn reset_all(&mut self) {
        for entry in self.entries.get_mut().values_mut() {
            entry.arena_mut().reset();
        }
    }

    /// Release every arena.
    pub fn release_all(&mut self) {
        debug!(arenas = self.entries.get_mut().len(), "releasing all region arenas");
        for entry in self.entries.get_mut().values_mut() {
            entry.arena_mut().release();
        }
    }

    /// Scope the `(R, A)` arena: allocators come from the returned guard and
    /// the arena is released when the guard drops.
    pub fn local<R: 'static, A: Access>(&mut self) -> Local<'_, R, A> {
        Local::new(self)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();
        let mut list = f.debug_list();
        for entry in entries.values() {
            list.entry(&format_args!(
                "{} ({:?}): {:?}",
                entry.region,
                entry.kind,
                entry.arena().stats()
            ));
        }
        list.finish()
    }
}
