//! Scoped use of one region.

use std::fmt;
use std::marker::PhantomData;

use crate::access::{Access, Arena, ExclusiveAccess};
use crate::allocator::MonotonicAllocator;
use crate::boxed::ArenaBox;
use crate::error::ArenaError;
use crate::registry::Registry;
use crate::storage::ArenaStats;

/// A guard over the `(R, A)` arena of a [`Registry`].
///
/// The guard holds the registry mutably, so nothing else can reach it while
/// the scope is open. Allocators and values handed out by the guard borrow
/// the guard; dropping it releases the arena's heap blocks.
///
/// ```
/// use monotonic_arena::{ExclusiveAccess, Registry};
///
/// enum Frame {}
///
/// let mut registry = Registry::new();
/// {
///     let scope = registry.local::<Frame, ExclusiveAccess>();
///     let mut v = allocator_api2::vec::Vec::new_in(scope.allocator::<u32>());
///     v.push(7);
///     assert!(scope.used() > 0);
/// }
/// assert_eq!(registry.stats::<Frame, ExclusiveAccess>().unwrap().used(), 0);
/// ```
pub struct Local<'g, R: 'static, A: Access = ExclusiveAccess> {
    registry: &'g mut Registry,
    _marker: PhantomData<fn() -> (R, A)>,
}

impl<'g, R: 'static, A: Access> Local<'g, R, A> {
    pub(crate) fn new(registry: &'g mut Registry) -> Self {
        Self {
            registry,
            _marker: PhantomData,
        }
    }

    /// The scoped arena.
    pub fn arena(&self) -> &A::Arena {
        self.registry.arena::<R, A>()
    }

    /// An allocator for `T` bound to the scoped arena.
    pub fn allocator<T>(&self) -> MonotonicAllocator<'_, T, R, A> {
        self.registry.allocator::<T, R, A>()
    }

    /// Move `value` into the scoped arena.
    pub fn create<T>(&self, value: T) -> Result<ArenaBox<'_, T>, ArenaError> {
        self.allocator::<T>().create(value)
    }

    /// Run the destructor of a value created in this scope.
    pub fn destroy<T>(&self, value: ArenaBox<'_, T>) {
        drop(value);
    }

    /// Rewind the arena without leaving the scope.
    pub fn reset(&mut self) {
        self.registry.reset::<R, A>();
    }

    /// Rewind the arena and free its heap blocks without leaving the scope.
    pub fn release(&mut self) {
        self.registry.release::<R, A>();
    }

    /// Usage of the scoped arena.
    pub fn stats(&self) -> ArenaStats {
        self.arena().stats()
    }

    /// Bytes in use, both tiers.
    pub fn used(&self) -> usize {
        self.arena().used()
    }

    /// Bytes in use in the inline buffer.
    pub fn fixed_used(&self) -> usize {
        self.arena().fixed_used()
    }

    /// Bytes in use in heap blocks.
    pub fn heap_used(&self) -> usize {
        self.arena().heap_used()
    }
}

impl<R: 'static, A: Access> Drop for Local<'_, R, A> {
    fn drop(&mut self) {
        self.registry.release::<R, A>();
    }
}

impl<R: 'static, A: Access> fmt::Debug for Local<'_, R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Local")
            .field("region", &std::any::type_name::<R>())
            .field("access", &A::KIND)
            .field("stats", &self.stats())
            .finish()
    }
}
