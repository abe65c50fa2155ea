//! Integration test: nested containers stay in their parent's region.
//!
//! Builds vectors of vectors and pairs through the arena-aware helpers and
//! checks that every nested allocation lands in the same arena as its
//! parent, and that scoped regions give all of it back on exit.

use monotonic_arena::containers::{resize_aware, Vec};
use monotonic_arena::{ExclusiveAccess, Registry, SharedAccess};
use monotonic_test_utils::{init_tracing, RegionA, RegionB};

type Row<'r> = Vec<'r, i32, RegionA>;
type Grid<'r> = Vec<'r, Row<'r>, RegionA>;

#[test]
fn nested_vectors_allocate_from_the_parent_region_only() {
    init_tracing();
    let registry = Registry::new();
    let alloc = registry.allocator::<Row<'_>, RegionA, ExclusiveAccess>();

    let mut grid: Grid<'_> = Grid::new_in(alloc);
    resize_aware(&mut grid, 16);
    let after_rows = alloc.stats().used();

    for (y, row) in grid.iter_mut().enumerate() {
        for x in 0..16 {
            row.push((y * 16 + x) as i32);
        }
    }

    assert!(alloc.stats().used() >= after_rows + 16 * 16 * 4);
    assert!(grid.iter().all(|row| *row.allocator() == alloc));
    assert_eq!(grid[15][15], 255);
    // Nothing leaked into another region.
    assert_eq!(registry.len(), 1);
    assert!(!registry.contains::<RegionB, ExclusiveAccess>());
}

#[test]
fn resize_aware_shrinks_like_truncate() {
    let registry = Registry::new();
    let alloc = registry.allocator::<Row<'_>, RegionA, ExclusiveAccess>();
    let mut grid: Grid<'_> = Grid::new_in(alloc);

    resize_aware(&mut grid, 8);
    grid[7].push(1);
    resize_aware(&mut grid, 3);
    assert_eq!(grid.len(), 3);
    resize_aware(&mut grid, 8);
    assert!(grid[7].is_empty());
}

#[test]
fn create_aware_builds_pairs_in_one_region() {
    let registry = Registry::new();
    let alloc = registry.allocator::<(), RegionB, SharedAccess>();

    type Names<'r> = Vec<'r, &'static str, RegionB, SharedAccess>;
    type Scores<'r> = Vec<'r, u64, RegionB, SharedAccess>;

    let mut table = alloc.create_aware::<(Names<'_>, Scores<'_>)>().unwrap();
    table.0.push("ada");
    table.1.push(36);

    assert!(*table.0.allocator() == alloc);
    assert!(*table.1.allocator() == alloc);
    assert_eq!(table.0.len(), table.1.len());
}

#[test]
fn scoped_region_returns_everything_on_exit() {
    let mut registry = Registry::new();
    {
        let scope = registry.local::<RegionA, ExclusiveAccess>();
        let mut grid: Grid<'_> = Grid::new_in(scope.allocator());
        resize_aware(&mut grid, 64);
        for row in grid.iter_mut() {
            row.extend(0..1024);
        }
        assert!(scope.heap_used() > 0);
    }
    let stats = registry.stats::<RegionA, ExclusiveAccess>().unwrap();
    assert_eq!(stats.used(), 0);
    assert_eq!(stats.block_count, 0);
}
