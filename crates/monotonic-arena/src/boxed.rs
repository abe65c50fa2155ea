//! Owning pointers to values constructed inside an arena.
//!
//! [`ArenaBox`] is what `create` returns: it owns the value (dropping it
//! runs the destructor) but not the memory, which the storage reclaims only
//! in bulk on reset or release.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

/// An owned value living in arena memory.
///
/// The lifetime `'a` is the borrow of the storage (or registry) the value
/// was created in, so the box cannot outlive a reset.
pub struct ArenaBox<'a, T: ?Sized> {
    ptr: NonNull<T>,
    _marker: PhantomData<(&'a (), T)>,
}

// SAFETY: an `ArenaBox` is the unique owner of its value, like `&mut T`.
unsafe impl<T: ?Sized + Send> Send for ArenaBox<'_, T> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: ?Sized + Sync> Sync for ArenaBox<'_, T> {}

impl<'a, T: ?Sized> ArenaBox<'a, T> {
    /// Take ownership of an initialised value in arena memory.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a valid, initialised `T` that nothing else owns,
    /// in memory that stays allocated for `'a`.
    pub(crate) unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Give up ownership without running the destructor.
    pub fn leak(this: Self) -> &'a mut T {
        let ptr = this.ptr;
        mem::forget(this);
        // SAFETY: the value is valid for `'a` and we were its only owner.
        unsafe { &mut *ptr.as_ptr() }
    }

    /// Raw pointer to the value.
    pub fn as_ptr(this: &Self) -> NonNull<T> {
        this.ptr
    }
}

impl<T> ArenaBox<'_, T> {
    /// Move the value out. The arena memory stays consumed.
    pub fn into_inner(this: Self) -> T {
        let ptr = this.ptr;
        mem::forget(this);
        // SAFETY: the value is initialised and, with `this` forgotten, read
        // exactly once.
        unsafe { ptr::read(ptr.as_ptr()) }
    }
}

impl<T: ?Sized> Deref for ArenaBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: valid and initialised for the box's lifetime.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ?Sized> DerefMut for ArenaBox<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: valid, initialised and uniquely owned.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: ?Sized> Drop for ArenaBox<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the value is initialised and dropped exactly once.
        unsafe { ptr::drop_in_place(self.ptr.as_ptr()) };
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ArenaBox<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for ArenaBox<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: ?Sized + PartialEq> PartialEq for ArenaBox<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}
