use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PipelineError, Result};

/// Makes `out_dir` an existing, empty directory.
///
/// Everything inside a pre-existing directory is removed; the directory
/// itself is kept. Nothing from a previous run survives. An `out_dir` that is
/// `project_root` or one of its ancestors is refused before anything is
/// deleted.
pub fn stage_output_dir(out_dir: &Path, project_root: &Path) -> Result<()> {
    ensure_outside_project(out_dir, project_root)
        .and_then(|()| empty_dir(out_dir))
        .map_err(|source| PipelineError::Staging {
            path: out_dir.to_path_buf(),
            source,
        })
}

fn ensure_outside_project(out_dir: &Path, project_root: &Path) -> io::Result<()> {
    let root = project_root.canonicalize()?;
    let out = resolve_lenient(out_dir)?;

    if root.starts_with(&out) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "output directory {} would contain the project root {}",
                out.display(),
                root.display()
            ),
        ));
    }

    Ok(())
}

/// Canonicalizes the longest existing prefix of `path` and appends the rest
/// lexically, so paths that do not exist yet still compare correctly.
fn resolve_lenient(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            // Trailing `..` or no parent left: fall back to a lexical walk.
            _ => break,
        }
    }

    let mut resolved = if existing.exists() {
        existing.canonicalize()?
    } else {
        existing.to_path_buf()
    };

    for name in rest.into_iter().rev() {
        resolved.push(name);
    }

    let mut normalized = PathBuf::new();
    for component in resolved.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }

    Ok(normalized)
}

fn empty_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        debug!(path = %dir.display(), "creating output directory");
        return fs::create_dir_all(dir);
    }

    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", dir.display()),
        ));
    }

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            // Files and symlinks, including links to directories.
            fs::remove_file(path)?;
        }
        debug!(path = %path.display(), "removed stale entry");
    }

    Ok(())
}
