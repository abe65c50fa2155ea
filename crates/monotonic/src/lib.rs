//! Monotonic: bump allocation with inline-first storage and typed regions.
//!
//! This is the facade crate that re-exports the public API of
//! `monotonic-arena` together with the `allocator-api2` containers the
//! adapter plugs into. For most users, adding `monotonic` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use monotonic::prelude::*;
//!
//! // Any 'static type can tag a region.
//! enum Frame {}
//!
//! let mut registry = Registry::new();
//! for frame in 0..3 {
//!     {
//!         let alloc = registry.allocator::<u32, Frame, ExclusiveAccess>();
//!         let mut visible: Vec<'_, u32, Frame> = Vec::new_in(alloc);
//!         visible.extend(0..100 * (frame + 1));
//!         assert_eq!(visible.len() as u32, 100 * (frame + 1));
//!     }
//!     // One bulk rewind per frame; heap blocks are kept for the next one.
//!     registry.reset::<Frame, ExclusiveAccess>();
//! }
//! assert_eq!(registry.stats::<Frame, ExclusiveAccess>().unwrap().used(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Source | Contents |
//! |--------|--------|----------|
//! | [`arena`] | `monotonic-arena` | Storage, access strategies, registry, adapter |
//! | [`containers`] | `monotonic-arena` | Region-bound `Vec` and `Box` aliases |
//! | [`api`] | `allocator-api2` | The `Allocator` trait and generic containers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Storage, access strategies, region registry and allocator adapter
/// (`monotonic-arena`).
///
/// Most users only need [`arena::Registry`] and
/// [`arena::MonotonicAllocator`]; both are also in the [`prelude`].
pub use monotonic_arena as arena;

/// Region-bound container aliases (`monotonic-arena::containers`).
pub use monotonic_arena::containers;

/// The allocator trait and allocator-generic containers (`allocator-api2`).
///
/// [`api::alloc::Allocator`] is the seam [`arena::MonotonicAllocator`]
/// implements; any container generic over it can live in an arena.
pub use allocator_api2 as api;

/// Common imports for typical usage.
///
/// ```rust
/// use monotonic::prelude::*;
/// ```
///
/// Brings in the registry, the adapter, the access tags, the storage types
/// and the region-bound container aliases.
pub mod prelude {
    // Registry and adapter
    pub use monotonic_arena::{DefaultRegion, Local, MonotonicAllocator, Registry};

    // Access strategies
    pub use monotonic_arena::{
        Access, Arena, ExclusiveAccess, SharedAccess, SharedStorage, ThreadLocalAccess,
        ThreadLocalStorage,
    };

    // Storage
    pub use monotonic_arena::{ArenaBox, ArenaStats, Storage, StorageConfig};

    // Construction
    pub use monotonic_arena::{resize_aware, ArenaAware};

    // Errors
    pub use monotonic_arena::ArenaError;

    // Containers
    pub use monotonic_arena::containers::{Box, Vec};
}
