use crate::error::{PipelineError, Result};

/// A release request. Only constructible with a non-empty version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    version: String,
}

impl BuildRequest {
    /// Resolves the version from the positional invocation argument.
    ///
    /// The string is returned untouched: no trimming, no semver parsing.
    pub fn from_arg(arg: Option<String>) -> Result<Self> {
        match arg {
            Some(version) if !version.is_empty() => Ok(Self { version }),
            _ => Err(PipelineError::MissingVersion),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
