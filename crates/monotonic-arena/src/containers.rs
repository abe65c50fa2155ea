//! Container aliases bound to a region.
//!
//! These are the `allocator_api2` containers with their allocator fixed to
//! [`MonotonicAllocator`], so `Vec<'r, T, Region>` reads like a plain
//! vector type while every allocation lands in `Region`'s arena.

use crate::access::{Access, ExclusiveAccess};
use crate::allocator::MonotonicAllocator;
use crate::aware::ArenaAware;
use crate::registry::DefaultRegion;

/// A growable array in region `R`.
pub type Vec<'r, T, R = DefaultRegion, A = ExclusiveAccess> =
    allocator_api2::vec::Vec<T, MonotonicAllocator<'r, T, R, A>>;

/// A single boxed value in region `R`.
pub type Box<'r, T, R = DefaultRegion, A = ExclusiveAccess> =
    allocator_api2::boxed::Box<T, MonotonicAllocator<'r, T, R, A>>;

/// Resize `vec` to `new_len`, building new elements bound to `vec`'s own
/// arena.
///
/// Growing a vector of vectors with `Default` would give every inner vector
/// an unbound allocator; this keeps the whole structure in one region.
pub fn resize_aware<'r, V, R, A>(vec: &mut Vec<'r, V, R, A>, new_len: usize)
where
    A: Access,
    V: ArenaAware<'r, R, A>,
{
    let alloc = *vec.allocator();
    while vec.len() < new_len {
        vec.push(V::new_in(alloc));
    }
    vec.truncate(new_len);
}
