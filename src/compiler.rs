use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::manifest::PackageManifest;
use crate::module_mapping::ModuleMappings;
use crate::shims::ShimOptions;

pub const DEFAULT_COMPILER: &str = "deno";
pub const DEFAULT_COMPILER_ARGS: &[&str] = &["run", "--allow-all"];

/// Deno script that reads [`BuildOptions`] from stdin and hands them to dnt's
/// `build()`. Written to a temporary file and passed as the last argument.
pub const DNT_DRIVER: &str = include_str!("../scripts/dnt_build.ts");

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Compiler '{program}' not found in PATH")]
    CompilerNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("Failed to serialize build options")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write compiler driver script")]
    Driver(#[source] io::Error),

    #[error("Failed to run compiler '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Compiler '{program}' exited with {}: {stderr}", exit_code_label(code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to inspect compiler output in {}", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("No compiled modules found in {}", out_dir.display())]
    NoModules { out_dir: PathBuf },

    #[error("Compiler did not write a package manifest at {}", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("Emitted package manifest at {} is unreadable", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Emitted manifest has version '{found}', expected '{expected}'")]
    VersionMismatch { expected: String, found: String },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Which standard-library surface the compiled output may assume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerOptions {
    pub lib: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl CompilerOptions {
    pub fn with_lib<'a>(lib: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            lib: lib.into_iter().map(str::to_string).collect(),
            target: None,
        }
    }
}

/// The complete configuration handed to the cross-runtime compiler.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    /// Relative to the project root.
    pub entry_points: Vec<String>,
    /// Relative to the project root unless absolute.
    pub out_dir: PathBuf,
    pub test_pattern: String,
    pub shims: ShimOptions,
    pub compiler_options: CompilerOptions,
    pub mappings: ModuleMappings,
    pub package: PackageManifest,
}

/// A cross-runtime compiler. Either everything compiles into `out_dir` or
/// the whole build fails with a single error.
pub trait Compiler {
    fn build(&self, project_root: &Path, options: &BuildOptions) -> Result<(), CompileError>;
}

/// Runs an external program and streams the build options to its stdin as
/// JSON. The program's stdout goes straight to ours; stderr is captured for
/// the error report.
pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
    driver: Option<&'static str>,
}

impl ProcessCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            driver: None,
        }
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Script source appended to the arguments as a temporary file path.
    pub fn driver(mut self, source: &'static str) -> Self {
        self.driver = Some(source);
        self
    }

    fn write_driver(source: &str) -> io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("npmbind-driver-")
            .suffix(".ts")
            .tempfile()?;
        file.write_all(source.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    fn command(
        &self,
        program_path: &Path,
        project_root: &Path,
        driver: Option<&Path>,
    ) -> Command {
        let mut cmd = Command::new(program_path);
        cmd.args(&self.args);
        if let Some(driver) = driver {
            cmd.arg(driver);
        }
        cmd.current_dir(project_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for ProcessCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_COMPILER)
            .args(DEFAULT_COMPILER_ARGS.iter().map(|s| s.to_string()).collect())
            .driver(DNT_DRIVER)
    }
}

impl Compiler for ProcessCompiler {
    fn build(&self, project_root: &Path, options: &BuildOptions) -> Result<(), CompileError> {
        let program_path =
            which::which(&self.program).map_err(|source| CompileError::CompilerNotFound {
                program: self.program.clone(),
                source,
            })?;

        let payload = serde_json::to_vec(options)?;

        // Kept alive until the compiler exits.
        let driver = self
            .driver
            .map(Self::write_driver)
            .transpose()
            .map_err(CompileError::Driver)?;
        let driver_path = driver.as_ref().map(|file| file.path());

        info!(
            program = %program_path.display(),
            args = ?self.args,
            driver = ?driver_path,
            "invoking compiler"
        );

        let spawn_error = |source| CompileError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = self
            .command(&program_path, project_root, driver_path)
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            // A compiler that exits without reading its input reports through
            // its exit status instead.
            match stdin.write_all(&payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("compiler closed stdin early");
                }
                Err(e) => return Err(spawn_error(e)),
            }
        }

        let output = child.wait_with_output().map_err(spawn_error)?;

        if !output.status.success() {
            return Err(CompileError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PackageProfile;
    use crate::version::BuildRequest;
    use tempfile::TempDir;

    fn options(version: &str) -> BuildOptions {
        let request = BuildRequest::from_arg(Some(version.to_string())).unwrap();
        PackageProfile::s3_lite_client().build_options(&request)
    }

    #[test]
    fn test_build_options_shape() {
        let value = serde_json::to_value(options("1.2.3")).unwrap();

        assert_eq!(value["entryPoints"], serde_json::json!(["./mod.ts"]));
        assert_eq!(value["outDir"], "./npm");
        assert_eq!(
            value["testPattern"],
            "**/*(*.test|integration).{ts,tsx,js,mjs,jsx}"
        );
        assert_eq!(value["shims"]["deno"]["test"], "dev");
        assert_eq!(value["compilerOptions"]["lib"], serde_json::json!(["ESNext", "DOM"]));
        assert_eq!(value["mappings"]["node:stream/web"]["name"], "node:stream/web");
        assert_eq!(value["package"]["version"], "1.2.3");
    }

    #[test]
    fn test_default_compiler_command() {
        let compiler = ProcessCompiler::default();
        assert_eq!(compiler.program, "deno");
        assert_eq!(compiler.args, vec!["run", "--allow-all"]);
        assert_eq!(compiler.driver, Some(DNT_DRIVER));
        assert!(DNT_DRIVER.contains("await build(options)"));
    }

    #[cfg(unix)]
    #[test]
    fn test_driver_runs_from_temporary_file() {
        let temp = TempDir::new().unwrap();
        let compiler = ProcessCompiler::new("sh").driver("cat > received.json\n");

        compiler.build(temp.path(), &options("3.0.0")).unwrap();

        let received = std::fs::read_to_string(temp.path().join("received.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&received).unwrap();
        assert_eq!(value["package"]["version"], "3.0.0");
        // The driver lives outside the project and is removed afterwards.
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_compiler() {
        let temp = TempDir::new().unwrap();
        let compiler = ProcessCompiler::new("npmbind-no-such-compiler");

        let err = compiler.build(temp.path(), &options("1.0.0")).unwrap_err();
        assert!(matches!(err, CompileError::CompilerNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_options_streamed_on_stdin() {
        let temp = TempDir::new().unwrap();
        let compiler = ProcessCompiler::new("sh")
            .args(vec!["-c".to_string(), "cat > received.json".to_string()]);

        compiler.build(temp.path(), &options("4.5.6")).unwrap();

        let received = std::fs::read_to_string(temp.path().join("received.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&received).unwrap();
        assert_eq!(value["package"]["version"], "4.5.6");
        assert_eq!(value["package"]["name"], "@capgo/s3-lite-client");
    }

    #[cfg(unix)]
    #[test]
    fn test_compiler_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let compiler = ProcessCompiler::new("sh").args(vec![
            "-c".to_string(),
            "echo 'error: Unable to resolve ./missing.ts' >&2; exit 3".to_string(),
        ]);

        let err = compiler.build(temp.path(), &options("1.0.0")).unwrap_err();
        match err {
            CompileError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("Unable to resolve"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
