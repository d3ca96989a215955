//! Core data structures for crossport.
//!
//! - The architecture table
//! - Build modules and the app catalog that declares them
//! - Target selection and host probing

pub mod app;
pub mod arch;
pub mod host;
pub mod module;
pub mod target;

pub use app::AppConfig;
pub use arch::Architecture;
pub use host::HostInfo;
pub use module::BuildModule;
pub use target::{BuildTarget, Compiler, Libc, Linkage, TargetRequest};
