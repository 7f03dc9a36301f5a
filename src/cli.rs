use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Component, Path, PathBuf};

use crate::compiler::{DEFAULT_COMPILER, ProcessCompiler};
use crate::pipeline::Pipeline;
use crate::profile::{DEFAULT_OUT_DIR, PackageProfile};
use crate::version::BuildRequest;

#[derive(Parser)]
#[command(name = "npmbind")]
#[command(about = "Package a Deno module as an npm release")]
#[command(version)]
pub struct Cli {
    /// Release version written verbatim into package.json
    #[arg(value_name = "VERSION")]
    pub release: Option<String>,

    /// Project directory holding the entry points, LICENSE and README.md
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// Output directory, relative to the project root. Emptied on every run
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// Compiler program; receives the build options as JSON on stdin
    #[arg(long, default_value = DEFAULT_COMPILER)]
    pub compiler: String,

    /// Argument passed to the compiler (repeatable)
    #[arg(long = "compiler-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub compiler_args: Vec<String>,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    release_command(cli)
}

fn release_command(cli: Cli) -> Result<()> {
    // Nothing touches the filesystem before the version is known.
    let request = BuildRequest::from_arg(cli.release)?;

    let compiler = compiler_for(cli.compiler, cli.compiler_args);
    let profile = PackageProfile::s3_lite_client().out_dir(cli.out_dir);

    println!("Building {} {}", profile.manifest.name, request.version());

    let pipeline = Pipeline::new(profile, &cli.project_root);
    let report = pipeline
        .run(&request, &compiler)
        .context("Release build failed")?;

    println!(
        "Compiled {} modules and {} type declarations into {}",
        report.modules,
        report.declarations,
        report.out_dir.display()
    );
    for file in &report.auxiliary_files {
        println!("  {}", file.display());
    }

    println!("{}", completion_message(&report.out_dir));

    Ok(())
}

fn compiler_for(program: String, args: Vec<String>) -> ProcessCompiler {
    if program == DEFAULT_COMPILER && args.is_empty() {
        return ProcessCompiler::default();
    }
    ProcessCompiler::new(program).args(args)
}

/// `cd <dir> && ... && cd ..` only returns to the start when the package sits
/// one level below the working directory; anything else gets a path argument.
fn completion_message(out_dir: &Path) -> String {
    let dir = out_dir.strip_prefix(".").unwrap_or(out_dir);
    let one_level = dir.components().count() == 1
        && matches!(dir.components().next(), Some(Component::Normal(_)));

    if one_level {
        format!("Build complete. Run `cd {} && npm publish && cd ..`.", dir.display())
    } else {
        format!("Build complete. Run `npm publish {}`.", dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["npmbind", "1.0.0"]).unwrap();

        assert_eq!(cli.release.as_deref(), Some("1.0.0"));
        assert_eq!(cli.project_root, PathBuf::from("."));
        assert_eq!(cli.out_dir, PathBuf::from("./npm"));
        assert_eq!(cli.compiler, "deno");
        assert!(cli.compiler_args.is_empty());
    }

    #[test]
    fn test_version_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["npmbind"]).unwrap();
        assert!(cli.release.is_none());
    }

    #[test]
    fn test_compiler_args_accept_flags() {
        let cli = Cli::try_parse_from([
            "npmbind",
            "1.0.0",
            "--compiler",
            "node",
            "--compiler-arg",
            "--experimental-strip-types",
            "--compiler-arg",
            "build.ts",
        ])
        .unwrap();

        assert_eq!(cli.compiler_args, vec!["--experimental-strip-types", "build.ts"]);
    }

    #[test]
    fn test_completion_message() {
        assert_eq!(
            completion_message(Path::new("././npm")),
            "Build complete. Run `cd npm && npm publish && cd ..`."
        );
        assert_eq!(
            completion_message(Path::new("dist/npm")),
            "Build complete. Run `npm publish dist/npm`."
        );
        assert_eq!(
            completion_message(Path::new("/work/pkg/npm")),
            "Build complete. Run `npm publish /work/pkg/npm`."
        );
    }
}
