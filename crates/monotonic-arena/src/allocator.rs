//! The allocator adapter handed to containers.
//!
//! A [`MonotonicAllocator`] is a borrowed, `Copy` handle to one arena. It
//! carries no allocation state of its own: two handles are equal exactly
//! when they point at the same arena under the same region and access tags,
//! whatever their element type, and rebinding to another element type keeps
//! that identity.
//!
//! The adapter implements [`allocator_api2::alloc::Allocator`], so any
//! container generic over that trait (`allocator_api2::vec::Vec`,
//! `allocator_api2::boxed::Box`, ...) can be built on an arena. Deallocation
//! is a no-op; memory returns when the owning registry or arena is reset,
//! which the borrow `'r` proves cannot happen while a handle is alive.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator};

use crate::access::{Access, Arena, ExclusiveAccess};
use crate::aware::ArenaAware;
use crate::boxed::ArenaBox;
use crate::error::ArenaError;
use crate::registry::DefaultRegion;
use crate::storage::ArenaStats;

/// Allocator for `T` values bound to the arena of region `R` under access
/// strategy `A`.
pub struct MonotonicAllocator<'r, T, R = DefaultRegion, A: Access = ExclusiveAccess> {
    arena: &'r A::Arena,
    _marker: PhantomData<(fn() -> T, fn() -> R)>,
}

impl<'r, T, R, A: Access> MonotonicAllocator<'r, T, R, A> {
    /// Bind an allocator to `arena`.
    ///
    /// Usually obtained from [`Registry::allocator`](crate::Registry::allocator);
    /// binding directly is useful for an arena owned outside a registry.
    pub fn new(arena: &'r A::Arena) -> Self {
        Self {
            arena,
            _marker: PhantomData,
        }
    }

    /// The arena this allocator draws from.
    pub fn arena(&self) -> &'r A::Arena {
        self.arena
    }

    /// The same allocator for another element type.
    pub fn rebind<U>(self) -> MonotonicAllocator<'r, U, R, A> {
        MonotonicAllocator::new(self.arena)
    }

    /// Address of the bound arena.
    ///
    /// Equality also compares the region and access tags, so one arena bound
    /// under two regions yields allocators that differ.
    pub fn storage_id(&self) -> *const () {
        (self.arena as *const A::Arena).cast()
    }

    /// Allocate uninitialised space for `n` values of `T`.
    pub fn allocate_n(&self, n: usize) -> Result<NonNull<T>, ArenaError> {
        let layout = Layout::array::<T>(n).map_err(|_| ArenaError::SizeOverflow {
            size: n.saturating_mul(std::mem::size_of::<T>()),
            align: std::mem::align_of::<T>(),
        })?;
        Ok(Arena::allocate(self.arena, layout)?.cast())
    }

    /// No-op: the memory comes back when the arena is reset or released.
    pub fn deallocate_n(&self, _ptr: NonNull<T>, _n: usize) {}

    /// Largest number of `T` values the arena could ever hold.
    pub fn max_size(&self) -> usize {
        self.arena.max_size() / std::mem::size_of::<T>().max(1)
    }

    /// Move `value` into the arena.
    pub fn create<V>(&self, value: V) -> Result<ArenaBox<'r, V>, ArenaError> {
        let ptr = Arena::allocate(self.arena, Layout::new::<V>())?.cast::<V>();
        // SAFETY: fresh, aligned, unaliased memory that stays allocated for
        // `'r`, because rewinding the arena needs a unique borrow of it.
        unsafe {
            ptr.as_ptr().write(value);
            Ok(ArenaBox::from_raw(ptr))
        }
    }

    /// Build an arena-aware value bound to this same arena.
    ///
    /// Unlike [`create`](Self::create) with a default-constructed value,
    /// nested containers end up in the parent's arena rather than in an
    /// unrelated one.
    pub fn make<V>(&self) -> V
    where
        V: ArenaAware<'r, R, A>,
    {
        V::new_in(*self)
    }

    /// [`make`](Self::make) a value and move it into the arena.
    pub fn create_aware<V>(&self) -> Result<ArenaBox<'r, V>, ArenaError>
    where
        V: ArenaAware<'r, R, A>,
    {
        self.create(self.make::<V>())
    }

    /// Run the destructor of a value created through this allocator.
    pub fn destroy<V>(&self, value: ArenaBox<'r, V>) {
        drop(value);
    }

    /// Usage counters of the bound arena.
    pub fn stats(&self) -> ArenaStats {
        self.arena.stats()
    }
}

impl<T, R, A: Access> Clone for MonotonicAllocator<'_, T, R, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, R, A: Access> Copy for MonotonicAllocator<'_, T, R, A> {}

impl<'a, 'b, T, U, R, R2, A, A2> PartialEq<MonotonicAllocator<'b, U, R2, A2>>
    for MonotonicAllocator<'a, T, R, A>
where
    R: 'static,
    R2: 'static,
    A: Access,
    A2: Access,
{
    fn eq(&self, other: &MonotonicAllocator<'b, U, R2, A2>) -> bool {
        TypeId::of::<R>() == TypeId::of::<R2>()
            && TypeId::of::<A>() == TypeId::of::<A2>()
            && self.storage_id() == other.storage_id()
    }
}

impl<T, R: 'static, A: Access> Eq for MonotonicAllocator<'_, T, R, A> {}

impl<T, R, A: Access> fmt::Debug for MonotonicAllocator<'_, T, R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonotonicAllocator")
            .field("element", &type_name::<T>())
            .field("region", &type_name::<R>())
            .field("access", &A::KIND)
            .field("arena", &self.storage_id())
            .finish()
    }
}

// SAFETY: blocks stay valid until the arena is reset or released, which
// requires a unique borrow that cannot coexist with `'r`. Copies share the
// arena, so memory from one copy may be passed to another.
unsafe impl<T, R, A: Access> Allocator for MonotonicAllocator<'_, T, R, A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        Arena::allocate(self.arena, layout)
            .map(|ptr| NonNull::slice_from_raw_parts(ptr, layout.size()))
            .map_err(|_| AllocError)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        Arena::deallocate(self.arena, ptr, layout);
    }
}
