//! Container workloads for benchmarking the monotonic allocator.
//!
//! Every workload is generic over [`Allocator`], so the same code runs on
//! the global allocator and on an arena:
//!
//! - [`fill_and_sort`]: build a vector from input, sort it, fold it
//! - [`nested_rows`]: a vector of vectors grown row by row
//! - [`pair_list`]: many small independent vectors, dropped in reverse
//!
//! Inputs come from [`random_numbers`], a seeded ChaCha8 stream, so runs
//! against different allocators see identical data.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use allocator_api2::alloc::Allocator;
use allocator_api2::vec::Vec;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `len` pseudo-random values from `seed`.
pub fn random_numbers(len: usize, seed: u64) -> std::vec::Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.next_u32()).collect()
}

/// Copy `input` into a fresh vector, sort it and fold the result.
pub fn fill_and_sort<A: Allocator>(alloc: A, input: &[u32]) -> u64 {
    let mut v = Vec::new_in(alloc);
    for &x in input {
        v.push(x);
    }
    v.sort_unstable();
    v.iter()
        .enumerate()
        .fold(0u64, |acc, (i, &x)| acc.wrapping_add(x as u64 ^ i as u64))
}

/// Build `rows` vectors of `cols` elements each, all from `alloc`.
pub fn nested_rows<A: Allocator + Clone>(alloc: A, rows: usize, cols: usize) -> usize {
    let mut grid = Vec::new_in(alloc.clone());
    for r in 0..rows {
        let mut row = Vec::new_in(alloc.clone());
        row.extend((0..cols).map(|c| (r * cols + c) as u32));
        grid.push(row);
    }
    grid.iter().map(|row| row.len()).sum()
}

/// Push `input` in pairs into many two-element vectors, then drop them
/// newest first.
pub fn pair_list<A: Allocator + Clone>(alloc: A, input: &[u32]) -> u64 {
    let mut pairs = Vec::new_in(alloc.clone());
    for chunk in input.chunks(2) {
        let mut pair = Vec::with_capacity_in(2, alloc.clone());
        pair.extend_from_slice(chunk);
        pairs.push(pair);
    }
    let mut total = 0u64;
    while let Some(pair) = pairs.pop() {
        total = total.wrapping_add(pair.iter().map(|&x| x as u64).sum::<u64>());
    }
    total
}
