//! Monotonic (bump) allocation with inline-first storage and typed regions.
//!
//! Memory is handed out by advancing a cursor and is never returned one
//! allocation at a time. A whole arena is rewound at once, either keeping
//! its heap blocks for reuse ([`Storage::reset`]) or freeing them
//! ([`Storage::release`]).
//!
//! # Architecture
//!
//! ```text
//! Registry (one arena per (region tag, access tag), created on first touch)
//! ├── ExclusiveAccess   → Storage<N>
//! ├── ThreadLocalAccess → ThreadLocalStorage<N> (one Storage<N> per thread)
//! └── SharedAccess      → SharedStorage<N> (Mutex<Storage<N>>)
//!
//! Storage<N>
//! ├── inline buffer: N bytes, 16-byte aligned, tried first
//! └── heap blocks: geometric growth, kept on reset, freed on release
//!
//! MonotonicAllocator<'r, T, R, A> → &'r A::Arena (Copy, implements Allocator)
//! ```
//!
//! # Rewinding safely
//!
//! Every operation that invalidates memory takes `&mut`: on a [`Storage`]
//! directly, or on the [`Registry`] for region arenas. Allocators, boxes and
//! containers borrow the arena, so the compiler rejects a reset while any of
//! them is alive.
//!
//! ```
//! use allocator_api2::vec::Vec;
//! use monotonic_arena::{ExclusiveAccess, Registry};
//!
//! enum Parse {}
//!
//! let mut registry = Registry::new();
//! {
//!     let alloc = registry.allocator::<u32, Parse, ExclusiveAccess>();
//!     let mut tokens = Vec::new_in(alloc);
//!     tokens.extend([1, 2, 3]);
//!     assert_eq!(tokens.len(), 3);
//! }
//! registry.reset::<Parse, ExclusiveAccess>();
//! assert_eq!(registry.stats::<Parse, ExclusiveAccess>().unwrap().used(), 0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod access;
pub mod allocator;
pub mod aware;
pub mod boxed;
pub mod config;
pub mod containers;
pub mod error;
pub mod local;
mod raw;
pub mod registry;
pub mod storage;

// Public re-exports for the primary API surface.
pub use access::{
    Access, AccessKind, Arena, ExclusiveAccess, SharedAccess, SharedStorage, ThreadLocalAccess,
    ThreadLocalStorage,
};
pub use allocator::MonotonicAllocator;
pub use aware::ArenaAware;
pub use boxed::ArenaBox;
pub use config::{StorageConfig, DEFAULT_INLINE_SIZE};
pub use containers::resize_aware;
pub use error::ArenaError;
pub use local::Local;
pub use registry::{DefaultRegion, Registry};
pub use storage::{layout_for, ArenaStats, Storage};
