//! Integration test: the facade prelude covers a full region lifecycle.

use monotonic::api::alloc::Allocator;
use monotonic::prelude::*;
use monotonic_test_utils::{DropCounter, RegionA, RegionB};

fn assert_allocator<A: Allocator + Copy>(_: A) {}

#[test]
fn prelude_drives_a_region_lifecycle() {
    let counter = DropCounter::new();
    let mut registry = Registry::with_config(StorageConfig::default()).unwrap();
    {
        let alloc = registry.allocator::<u64, RegionA, ExclusiveAccess>();
        assert_allocator(alloc);

        let mut v: Vec<'_, u64, RegionA> = Vec::new_in(alloc);
        v.extend(0..1000);
        let b: Box<'_, u64, RegionA> = Box::new_in(7, alloc);
        assert_eq!(*b + v[999], 1006);

        let tracked = alloc.create(counter.track("x")).unwrap();
        drop(tracked);
    }
    assert_eq!(counter.drops(), 1);

    registry.release_all();
    assert_eq!(registry.stats::<RegionA, ExclusiveAccess>().unwrap().used(), 0);
}

#[test]
fn local_scope_through_the_facade() {
    let mut registry = Registry::new();
    {
        let scope: Local<'_, RegionB, SharedAccess> = registry.local();
        let mut rows: Vec<'_, Vec<'_, u8, RegionB, SharedAccess>, RegionB, SharedAccess> =
            Vec::new_in(scope.allocator());
        resize_aware(&mut rows, 4);
        rows[0].push(1);
        assert!(scope.used() > 0);
    }
    assert_eq!(registry.stats::<RegionB, SharedAccess>().unwrap().used(), 0);
}

#[test]
fn errors_are_reported_through_the_facade() {
    let bad = StorageConfig::new().with_min_heap_increment(0);
    let err = Registry::with_config(bad).unwrap_err();
    assert!(matches!(err, ArenaError::InvalidConfig { .. }));
    assert!(err.to_string().contains("min_heap_increment"));
}
