//! File delivery pipeline
//!
//! Resolution, access policy and streaming of files under the base directory.
//! The request orchestration that sequences these lives in `handler::files`.

pub mod fs;
pub mod policy;
pub mod pump;
pub mod resolver;

pub use fs::{FileMetadata, FileSystem, LocalFileSystem};
pub use policy::{validate, ServableFile};
pub use pump::{pump, PumpOutcome};
pub use resolver::{resolve, ResolvedTarget, ROUTE_PREFIX};
