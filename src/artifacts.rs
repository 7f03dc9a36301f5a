use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::compiler::CompileError;
use crate::error::{PipelineError, Result};
use crate::manifest::{self, EmittedManifest};

pub const MANIFEST_FILE: &str = "package.json";

/// A file the compiler does not produce, copied into the package afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryFile {
    /// Relative to the project root.
    pub source: PathBuf,
    /// Relative to the output directory.
    pub destination: PathBuf,
}

impl AuxiliaryFile {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Module,
    Declaration,
}

impl ArtifactKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;

        if [".d.ts", ".d.mts", ".d.cts"]
            .iter()
            .any(|ext| file_name.ends_with(ext))
        {
            return Some(ArtifactKind::Declaration);
        }

        match path.extension()?.to_str()? {
            "js" | "mjs" | "cjs" => Some(ArtifactKind::Module),
            _ => None,
        }
    }
}

/// What the compiler left in the output directory.
#[derive(Debug, Clone, Default)]
pub struct EmittedPackage {
    pub modules: Vec<PathBuf>,
    pub declarations: Vec<PathBuf>,
    pub manifest: Option<PathBuf>,
}

impl EmittedPackage {
    /// Walks `out_dir`, skipping installed dependencies.
    pub fn discover(out_dir: &Path) -> std::result::Result<Self, CompileError> {
        let mut emitted = EmittedPackage::default();

        let walker = WalkDir::new(out_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != "node_modules");

        for entry in walker {
            let entry = entry.map_err(|source| CompileError::Inspect {
                path: out_dir.to_path_buf(),
                source,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            let at_root = path.parent() == Some(out_dir);
            if at_root && path.file_name() == Some(OsStr::new(MANIFEST_FILE)) {
                emitted.manifest = Some(path);
                continue;
            }

            match ArtifactKind::from_path(&path) {
                Some(ArtifactKind::Module) => emitted.modules.push(path),
                Some(ArtifactKind::Declaration) => emitted.declarations.push(path),
                None => {}
            }
        }

        Ok(emitted)
    }

    /// Checks the compiler produced a usable package for `version`.
    pub fn verify(
        &self,
        out_dir: &Path,
        version: &str,
    ) -> std::result::Result<EmittedManifest, CompileError> {
        if self.modules.is_empty() {
            return Err(CompileError::NoModules {
                out_dir: out_dir.to_path_buf(),
            });
        }

        let manifest_path = self
            .manifest
            .as_deref()
            .ok_or_else(|| CompileError::ManifestMissing {
                path: out_dir.join(MANIFEST_FILE),
            })?;

        let emitted = manifest::read_manifest(manifest_path).map_err(|e| {
            CompileError::ManifestUnreadable {
                path: manifest_path.to_path_buf(),
                source: e.into(),
            }
        })?;

        if emitted.version != version {
            return Err(CompileError::VersionMismatch {
                expected: version.to_string(),
                found: emitted.version,
            });
        }

        Ok(emitted)
    }
}

/// Copies auxiliary files into a compiled package.
pub struct ArtifactFinalizer {
    project_root: PathBuf,
    out_dir: PathBuf,
}

impl ArtifactFinalizer {
    pub fn new(project_root: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    /// Copies every file in order, overwriting existing destinations. Stops
    /// at the first failure; files copied before it stay in place.
    pub fn finalize(&self, files: &[AuxiliaryFile]) -> Result<Vec<PathBuf>> {
        let mut copied = Vec::with_capacity(files.len());

        for file in files {
            copied.push(self.copy_file(file)?);
        }

        Ok(copied)
    }

    fn copy_file(&self, file: &AuxiliaryFile) -> Result<PathBuf> {
        let from = self.project_root.join(&file.source);
        let to = self.out_dir.join(&file.destination);

        let finalization_error = |source| PipelineError::Finalization {
            from: from.clone(),
            to: to.clone(),
            source,
        };

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(finalization_error)?;
        }

        fs::copy(&from, &to).map_err(finalization_error)?;

        debug!(from = %from.display(), to = %to.display(), "copied auxiliary file");

        Ok(to)
    }
}
