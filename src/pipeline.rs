use std::path::{Path, PathBuf};
use tracing::{info, info_span};

use crate::artifacts::{ArtifactFinalizer, EmittedPackage};
use crate::compiler::Compiler;
use crate::error::Result;
use crate::profile::PackageProfile;
use crate::staging;
use crate::version::BuildRequest;

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub out_dir: PathBuf,
    pub package_name: String,
    pub version: String,
    pub modules: usize,
    pub declarations: usize,
    pub auxiliary_files: Vec<PathBuf>,
}

/// Runs one release: stage, compile, inspect, finalize. Each stage starts
/// only after the previous one succeeded.
pub struct Pipeline {
    profile: PackageProfile,
    project_root: PathBuf,
}

impl Pipeline {
    pub fn new(profile: PackageProfile, project_root: impl AsRef<Path>) -> Self {
        Self {
            profile,
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    pub fn out_dir(&self) -> PathBuf {
        self.project_root.join(&self.profile.out_dir)
    }

    pub fn run(&self, request: &BuildRequest, compiler: &dyn Compiler) -> Result<PipelineReport> {
        let span = info_span!("release", version = request.version());
        let _guard = span.enter();

        let out_dir = self.out_dir();

        staging::stage_output_dir(&out_dir, &self.project_root)?;
        info!(out_dir = %out_dir.display(), "output directory staged");

        let options = self.profile.build_options(request);
        info!(
            redirects = ?options.mappings.specifiers(),
            entry_points = ?options.entry_points,
            "build options assembled"
        );
        compiler.build(&self.project_root, &options)?;

        let emitted = EmittedPackage::discover(&out_dir)?;
        let manifest = emitted.verify(&out_dir, request.version())?;
        info!(
            modules = emitted.modules.len(),
            declarations = emitted.declarations.len(),
            "compilation finished"
        );

        let finalizer = ArtifactFinalizer::new(&self.project_root, &out_dir);
        let auxiliary_files = finalizer.finalize(&self.profile.auxiliary_files)?;

        Ok(PipelineReport {
            out_dir,
            package_name: manifest.name,
            version: manifest.version,
            modules: emitted.modules.len(),
            declarations: emitted.declarations.len(),
            auxiliary_files,
        })
    }
}
