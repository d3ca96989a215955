//! Crossport - module resolver and cross-target vcpkg driver
//!
//! This crate provides the core library functionality for crossport:
//! build-module resolution, external library mapping, triplet resolution,
//! vcpkg manifest and overlay generation, and install orchestration.

pub mod core;
pub mod cross;
pub mod ops;
pub mod resolver;
pub mod util;
pub mod vcpkg;

/// Test utilities and mocks for crossport unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides fixture catalogs and mock implementations of
/// the packaging engine and host probing.
#[cfg(test)]
pub(crate) mod test_support;

pub use core::{AppConfig, BuildModule, BuildTarget};
pub use ops::{Session, SessionOptions};
pub use resolver::{BuildPlan, ResolveError};
pub use util::context::GlobalContext;
