// Range tests are written as explicit bound comparisons
#![allow(clippy::manual_range_contains)]

/// Use mimalloc as the global allocator for all binaries.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod case;
pub mod common;
