use std::path::PathBuf;

use thiserror::Error;

use crate::compiler::CompileError;

/// Failures of a release run, in the order the stages can produce them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Please specify a version.")]
    MissingVersion,

    #[error("Failed to stage output directory {}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compilation failed")]
    Compilation(#[from] CompileError),

    #[error("Failed to copy {} to {}", from.display(), to.display())]
    Finalization {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
