pub mod version;
pub mod staging;
pub mod shims;
pub mod module_mapping;
pub mod manifest;
pub mod compiler;
pub mod artifacts;
pub mod profile;
pub mod pipeline;
pub mod error;
pub mod cli;

pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineReport};
pub use version::BuildRequest;
