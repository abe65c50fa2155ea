//! Low-level primitives for arena memory operations.
//!
//! Everything that talks to the system allocator or does pointer
//! arithmetic on raw blocks lives here, so the rest of the crate only
//! handles offsets and `NonNull` results. Each `unsafe` block carries a
//! `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::ArenaError;

/// Minimum alignment of every heap block and of the inline buffer.
pub(crate) const BLOCK_ALIGN: usize = 16;

/// Compute the `(start, end)` offsets of a bump allocation of `layout`
/// beginning at `cursor` in a region of `capacity` bytes based at `base`.
///
/// Returns `None` if the aligned request does not fit. Alignment is
/// computed from the real address, so a region whose base is less aligned
/// than the request pays for the difference in padding. A zero-size request
/// still takes one byte, so no two calls return the same address.
pub(crate) fn bump_offsets(
    base: NonNull<u8>,
    cursor: usize,
    capacity: usize,
    layout: Layout,
) -> Option<(usize, usize)> {
    let pad = base
        .as_ptr()
        .wrapping_add(cursor)
        .align_offset(layout.align());
    let start = cursor.checked_add(pad)?;
    let end = start.checked_add(layout.size().max(1))?;
    (end <= capacity).then_some((start, end))
}

/// Offset `base` by `offset` bytes.
///
/// # Safety
///
/// `offset` must not exceed the size of the allocation `base` points into.
pub(crate) unsafe fn offset_ptr(base: NonNull<u8>, offset: usize) -> NonNull<u8> {
    // SAFETY: caller guarantees `offset` stays within (or one past) the
    // allocation, and an in-bounds offset of a non-null pointer is non-null.
    unsafe { NonNull::new_unchecked(base.as_ptr().add(offset)) }
}

/// A single heap block acquired from the system allocator.
///
/// The block owns its memory and frees it on drop. It never hands memory
/// back individually: `reset` rewinds the cursor and keeps the capacity.
pub(crate) struct HeapBlock {
    ptr: NonNull<u8>,
    layout: Layout,
    /// Bump pointer: next free byte offset.
    cursor: usize,
}

// SAFETY: a `HeapBlock` is the unique owner of its allocation; moving it to
// another thread moves that ownership with it.
unsafe impl Send for HeapBlock {}

impl HeapBlock {
    /// Acquire a block of at least `capacity` bytes whose base is aligned to
    /// `max(align, BLOCK_ALIGN)`.
    pub(crate) fn new(capacity: usize, align: usize) -> Result<Self, ArenaError> {
        let capacity = capacity.max(1);
        let layout = Layout::from_size_align(capacity, align.max(BLOCK_ALIGN)).map_err(|_| {
            ArenaError::SizeOverflow {
                size: capacity,
                align,
            }
        })?;
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).ok_or(ArenaError::OutOfMemory {
            requested: capacity,
        })?;
        Ok(Self {
            ptr,
            layout,
            cursor: 0,
        })
    }

    /// Bump-allocate `layout` from this block, or `None` if it does not fit.
    pub(crate) fn bump(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        let (start, end) = bump_offsets(self.ptr, self.cursor, self.capacity(), layout)?;
        self.cursor = end;
        // SAFETY: `start <= end <= capacity`, so the offset stays inside the block.
        Some(unsafe { offset_ptr(self.ptr, start) })
    }

    /// Rewind the cursor without freeing the block.
    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Bytes handed out since the last reset, padding included.
    pub(crate) fn used(&self) -> usize {
        self.cursor
    }

    /// Total size of the block in bytes.
    pub(crate) fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Whether `ptr` points into this block.
    pub(crate) fn contains(&self, ptr: NonNull<u8>) -> bool {
        let base = self.ptr.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= base && addr < base + self.capacity()
    }
}

impl Drop for HeapBlock {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc::alloc(self.layout)` and is
        // freed exactly once, here.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}
