//! Benchmark utilities for tickworks.
//!
//! - **Microbenchmarks**: Individual world operations (spawn, cached step, invalidation)
//! - **Scenario benchmarks**: A particle swarm stepped tick after tick
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p tickworks_bench
//!
//! # Run specific benchmark group
//! cargo bench -p tickworks_bench -- step
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports for visualization.

pub mod components;
pub mod scenarios;
