//! Stagekit Client - source-of-truth adapters for fetch/submit

pub mod http;
pub mod memory;
pub mod source;

pub use http::{HttpAssemblySource, DEFAULT_FETCH_PATH, DEFAULT_SUBMIT_PATH};
pub use memory::MemorySource;
pub use source::{AssemblySource, SourceError, SourceResult};
pub use tokio_util::sync::CancellationToken;
