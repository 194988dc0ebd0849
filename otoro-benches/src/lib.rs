//! Benchmark support library: parameter types and synthetic data sources
//! shared by the criterion benches.

pub mod params;
pub mod source;

/// Seed shared by every benchmark so runs stay comparable.
pub const BENCH_SEED: u64 = 0x5EED_0707;
