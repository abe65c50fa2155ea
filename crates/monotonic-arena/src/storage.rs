//! Hybrid inline/heap bump storage.
//!
//! A [`Storage`] starts with a fixed-capacity inline buffer embedded in the
//! value itself and overflows into heap blocks acquired from the system
//! allocator. Allocation only ever moves a cursor forward; memory comes
//! back in bulk through [`Storage::reset`] (keeps heap capacity) or
//! [`Storage::release`] (frees them).
//!
//! ```text
//! Storage<N>
//! ├── inline: [u8; N] (16-byte aligned) ── fixed_cursor
//! └── blocks: Vec<HeapBlock>
//!     ├── block 0 ── cursor
//!     ├── block 1 ── cursor   ◀── active
//!     └── block 2 (retained after reset, reused before growing)
//! ```

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::cell::{Cell, RefCell, UnsafeCell};
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

use tracing::{debug, trace, warn};

use crate::boxed::ArenaBox;
use crate::config::{StorageConfig, DEFAULT_INLINE_SIZE};
use crate::error::ArenaError;
use crate::raw::{self, HeapBlock, BLOCK_ALIGN};

/// Build a layout from a raw `(size, align)` pair, rejecting bad alignments
/// instead of rounding them.
pub fn layout_for(size: usize, align: usize) -> Result<Layout, ArenaError> {
    if !align.is_power_of_two() {
        return Err(ArenaError::InvalidAlignment { align });
    }
    Layout::from_size_align(size, align).map_err(|_| ArenaError::SizeOverflow { size, align })
}

/// The inline buffer. Its alignment must equal [`BLOCK_ALIGN`].
#[repr(C, align(16))]
struct InlineBuffer<const N: usize> {
    bytes: UnsafeCell<[MaybeUninit<u8>; N]>,
}

const _: () = assert!(std::mem::align_of::<InlineBuffer<0>>() == BLOCK_ALIGN);

/// Point-in-time usage counters of a storage.
///
/// Returned by [`Storage::stats`] and by every access strategy, so shared
/// storages can report all counters under a single lock acquisition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Capacity of the inline buffer in bytes.
    pub inline_capacity: usize,
    /// Bytes consumed from the inline buffer, alignment padding included.
    pub fixed_used: usize,
    /// Bytes consumed from heap blocks, alignment padding included.
    pub heap_used: usize,
    /// Total capacity of retained heap blocks.
    pub heap_capacity: usize,
    /// Number of retained heap blocks.
    pub block_count: usize,
    /// Largest number of bytes the storage could ever hold.
    pub max_size: usize,
}

impl ArenaStats {
    /// Counters of a storage that has never allocated.
    pub(crate) fn fresh(inline_capacity: usize, config: &StorageConfig) -> Self {
        Self {
            inline_capacity,
            max_size: max_size_for(inline_capacity, config),
            ..Self::default()
        }
    }

    /// Total bytes consumed: `fixed_used + heap_used`.
    pub fn used(&self) -> usize {
        self.fixed_used + self.heap_used
    }

    /// Bytes left in the inline buffer.
    pub fn fixed_remaining(&self) -> usize {
        self.inline_capacity - self.fixed_used
    }
}

fn max_size_for(inline_capacity: usize, config: &StorageConfig) -> usize {
    config
        .heap_limit
        .map_or(isize::MAX as usize, |limit| inline_capacity.saturating_add(limit))
}

/// A monotonic bump allocator over an inline buffer of `N` bytes plus
/// heap-backed overflow blocks.
///
/// Allocation takes `&self`; [`reset`](Self::reset) and
/// [`release`](Self::release) take `&mut self`, so nothing borrowed from the
/// storage can outlive a rewind. Individual allocations are never freed.
///
/// `Storage` is `Send` but not `Sync`: it is the exclusive access strategy.
/// Wrap it in [`SharedStorage`](crate::SharedStorage) or
/// [`ThreadLocalStorage`](crate::ThreadLocalStorage) to share it.
pub struct Storage<const N: usize = DEFAULT_INLINE_SIZE> {
    inline: InlineBuffer<N>,
    fixed_cursor: Cell<usize>,
    blocks: RefCell<Vec<HeapBlock>>,
    /// Index of the heap block currently being filled.
    active: Cell<usize>,
    heap_used: Cell<usize>,
    heap_capacity: Cell<usize>,
    config: StorageConfig,
}

impl<const N: usize> Storage<N> {
    /// Create an empty storage with the default heap configuration.
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    /// Create an empty storage with the given heap configuration.
    ///
    /// The config is used as given; call [`StorageConfig::validate`] first
    /// if it comes from untrusted input. A zero increment or growth factor
    /// still yields blocks just large enough for each request.
    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            inline: InlineBuffer {
                bytes: UnsafeCell::new([const { MaybeUninit::uninit() }; N]),
            },
            fixed_cursor: Cell::new(0),
            blocks: RefCell::new(Vec::new()),
            active: Cell::new(0),
            heap_used: Cell::new(0),
            heap_capacity: Cell::new(0),
            config,
        }
    }

    /// The heap configuration this storage grows with.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn inline_base(&self) -> NonNull<u8> {
        // SAFETY: `UnsafeCell::get` never returns null.
        unsafe { NonNull::new_unchecked(self.inline.bytes.get().cast::<u8>()) }
    }

    /// Allocate memory for `layout`.
    ///
    /// The inline buffer is tried first, then the active heap block, then
    /// any later block retained from before a reset. Only when none of them
    /// has room is a new block requested from the system allocator.
    pub fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        if let Some(ptr) = self.bump_inline(layout) {
            return Ok(ptr);
        }
        self.bump_heap(layout)
    }

    /// Allocate `size` bytes aligned to `align`.
    ///
    /// Fails with [`ArenaError::InvalidAlignment`] if `align` is zero or not
    /// a power of two.
    pub fn allocate_bytes(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        self.allocate(layout_for(size, align)?)
    }

    /// Individual deallocation is a no-op; memory returns on reset/release.
    pub fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}

    fn bump_inline(&self, layout: Layout) -> Option<NonNull<u8>> {
        let base = self.inline_base();
        let (start, end) = raw::bump_offsets(base, self.fixed_cursor.get(), N, layout)?;
        self.fixed_cursor.set(end);
        // SAFETY: `start <= end <= N`, inside the inline buffer.
        Some(unsafe { raw::offset_ptr(base, start) })
    }

    fn bump_heap(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        let mut blocks = self.blocks.borrow_mut();

        // Active block first, then blocks retained from a previous cycle.
        for (index, block) in blocks.iter_mut().enumerate().skip(self.active.get()) {
            let before = block.used();
            if let Some(ptr) = block.bump(layout) {
                self.heap_used.set(self.heap_used.get() + (block.used() - before));
                self.active.set(index);
                return Ok(ptr);
            }
        }

        let last = blocks.last().map_or(0, HeapBlock::capacity);
        let mut size = self.config.next_block_size(layout.size(), last);
        if let Some(limit) = self.config.heap_limit {
            let retained = self.heap_capacity.get();
            if retained.saturating_add(size) > limit {
                // Fall back to an exact fit before giving up.
                size = layout.size().max(1);
                if retained.saturating_add(size) > limit {
                    warn!(
                        requested = layout.size(),
                        retained, limit, "heap limit rejects new block"
                    );
                    return Err(ArenaError::CapacityExceeded {
                        requested: layout.size(),
                        capacity: limit,
                    });
                }
            }
        }

        let mut block = HeapBlock::new(size, layout.align())?;
        let ptr = block.bump(layout).ok_or(ArenaError::OutOfMemory {
            requested: layout.size(),
        })?;
        self.heap_used.set(self.heap_used.get() + block.used());
        self.heap_capacity.set(self.heap_capacity.get() + block.capacity());
        blocks.push(block);
        self.active.set(blocks.len() - 1);
        debug!(
            size,
            blocks = blocks.len(),
            heap_capacity = self.heap_capacity.get(),
            "acquired heap block"
        );
        Ok(ptr)
    }

    /// Rewind every cursor to zero, keeping heap capacity for reuse.
    ///
    /// When more than one heap block is retained they are replaced by a
    /// single block of their combined capacity, so any request up to the
    /// previous peak heap usage fits without touching the system allocator.
    pub fn reset(&mut self) {
        trace!(
            fixed_used = self.fixed_cursor.get(),
            heap_used = self.heap_used.get(),
            "reset storage"
        );
        self.fixed_cursor.set(0);
        self.active.set(0);
        self.heap_used.set(0);

        let blocks = self.blocks.get_mut();
        if blocks.len() > 1 {
            let merged = blocks.len();
            let capacity = self.heap_capacity.get();
            blocks.clear();
            match HeapBlock::new(capacity, BLOCK_ALIGN) {
                Ok(block) => {
                    blocks.push(block);
                    debug!(merged, capacity, "coalesced heap blocks");
                }
                Err(err) => {
                    self.heap_capacity.set(0);
                    warn!(merged, capacity, %err, "failed to coalesce heap blocks");
                }
            }
        } else {
            for block in blocks.iter_mut() {
                block.reset();
            }
        }
    }

    /// Reset, then return every heap block to the system allocator.
    ///
    /// The storage is left exactly as freshly constructed and is fully
    /// reusable.
    pub fn release(&mut self) {
        self.reset();
        let blocks = self.blocks.get_mut();
        if !blocks.is_empty() {
            trace!(
                blocks = blocks.len(),
                heap_capacity = self.heap_capacity.get(),
                "release heap blocks"
            );
        }
        blocks.clear();
        self.heap_capacity.set(0);
    }

    /// Total bytes consumed: `fixed_used() + heap_used()`.
    pub fn used(&self) -> usize {
        self.fixed_used() + self.heap_used()
    }

    /// Bytes consumed from the inline buffer, padding included.
    pub fn fixed_used(&self) -> usize {
        self.fixed_cursor.get()
    }

    /// Bytes consumed from heap blocks, padding included.
    pub fn heap_used(&self) -> usize {
        self.heap_used.get()
    }

    /// Bytes left in the inline buffer.
    ///
    /// Capacity left in retained heap blocks is not counted; see
    /// [`heap_capacity`](Self::heap_capacity).
    pub fn remaining(&self) -> usize {
        self.fixed_remaining()
    }

    /// Bytes left in the inline buffer.
    pub fn fixed_remaining(&self) -> usize {
        N - self.fixed_cursor.get()
    }

    /// Capacity of the inline buffer.
    pub const fn inline_capacity(&self) -> usize {
        N
    }

    /// Total capacity of retained heap blocks.
    pub fn heap_capacity(&self) -> usize {
        self.heap_capacity.get()
    }

    /// Number of retained heap blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Largest number of bytes this storage could ever hold.
    pub fn max_size(&self) -> usize {
        max_size_for(N, &self.config)
    }

    /// Snapshot of all counters.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            inline_capacity: N,
            fixed_used: self.fixed_used(),
            heap_used: self.heap_used(),
            heap_capacity: self.heap_capacity(),
            block_count: self.block_count(),
            max_size: self.max_size(),
        }
    }

    /// Whether `ptr` points into the inline buffer or a retained heap block.
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let base = self.inline_base().as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        if addr >= base && addr < base + N {
            return true;
        }
        self.blocks.borrow().iter().any(|block| block.contains(ptr))
    }

    /// Move `value` into the storage.
    ///
    /// Dropping the returned box runs `T`'s destructor; the memory itself is
    /// reclaimed only by reset or release.
    pub fn create<T>(&self, value: T) -> Result<ArenaBox<'_, T>, ArenaError> {
        self.create_with(|| value)
    }

    /// Allocate space for a `T` and construct it in place from `f`.
    pub fn create_with<T, F>(&self, f: F) -> Result<ArenaBox<'_, T>, ArenaError>
    where
        F: FnOnce() -> T,
    {
        let ptr = self.allocate(Layout::new::<T>())?.cast::<T>();
        // SAFETY: `ptr` is freshly allocated, aligned for `T` and unaliased.
        unsafe {
            ptr.as_ptr().write(f());
            Ok(ArenaBox::from_raw(ptr))
        }
    }

    /// Construct a default `T` in the storage.
    pub fn create_default<T: Default>(&self) -> Result<ArenaBox<'_, T>, ArenaError> {
        self.create_with(T::default)
    }

    /// Run the destructor of a value created in this storage.
    ///
    /// The memory stays consumed until reset or release.
    pub fn destroy<T>(&self, value: ArenaBox<'_, T>) {
        drop(value);
    }

    /// Copy a slice into the storage.
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> Result<&mut [T], ArenaError> {
        let layout = Layout::array::<T>(src.len()).map_err(|_| ArenaError::SizeOverflow {
            size: src.len().saturating_mul(std::mem::size_of::<T>()),
            align: std::mem::align_of::<T>(),
        })?;
        let dst = self.allocate(layout)?.cast::<T>();
        // SAFETY: `dst` is fresh, aligned and large enough for `src.len()`
        // elements; fresh arena memory never overlaps `src`.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), src.len());
            Ok(std::slice::from_raw_parts_mut(dst.as_ptr(), src.len()))
        }
    }

    /// Copy a string into the storage.
    pub fn alloc_str(&self, src: &str) -> Result<&mut str, ArenaError> {
        let bytes = self.alloc_slice_copy(src.as_bytes())?;
        // SAFETY: the bytes were copied verbatim from a valid `str`.
        Ok(unsafe { std::str::from_utf8_unchecked_mut(bytes) })
    }
}

impl<const N: usize> Default for Storage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for Storage<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("inline_capacity", &N)
            .field("fixed_used", &self.fixed_used())
            .field("heap_used", &self.heap_used())
            .field("heap_capacity", &self.heap_capacity())
            .field("block_count", &self.block_count())
            .finish()
    }
}
