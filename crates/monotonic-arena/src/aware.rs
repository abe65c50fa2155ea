//! Construction of values that allocate from a given arena.
//!
//! A container default-constructed inside an arena would otherwise carry no
//! allocator at all. [`ArenaAware`] types instead receive the parent's
//! allocator when they are built, so nested containers (a vector of
//! vectors, a pair of vectors, ...) draw from the same arena as their
//! parent.

use allocator_api2::vec::Vec;

use crate::access::Access;
use crate::allocator::MonotonicAllocator;

/// A value that can be built bound to an arena.
pub trait ArenaAware<'r, R, A: Access>: Sized {
    /// Construct an empty value whose allocations come from `alloc`'s arena.
    fn new_in<T>(alloc: MonotonicAllocator<'r, T, R, A>) -> Self;
}

impl<'r, T, R, A: Access> ArenaAware<'r, R, A> for Vec<T, MonotonicAllocator<'r, T, R, A>> {
    fn new_in<U>(alloc: MonotonicAllocator<'r, U, R, A>) -> Self {
        Vec::new_in(alloc.rebind())
    }
}

impl<'r, R, A, X, Y> ArenaAware<'r, R, A> for (X, Y)
where
    A: Access,
    X: ArenaAware<'r, R, A>,
    Y: ArenaAware<'r, R, A>,
{
    fn new_in<T>(alloc: MonotonicAllocator<'r, T, R, A>) -> Self {
        (X::new_in(alloc), Y::new_in(alloc))
    }
}
