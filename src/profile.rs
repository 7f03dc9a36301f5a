//! Static description of the package being released.
//!
//! Everything here is fixed at design time and built once at process start;
//! only the version comes from the invocation.

use std::path::PathBuf;

use crate::artifacts::AuxiliaryFile;
use crate::compiler::{BuildOptions, CompilerOptions};
use crate::manifest::{Bugs, ManifestTemplate, Person, Repository};
use crate::module_mapping::ModuleMappings;
use crate::shims::ShimOptions;
use crate::version::BuildRequest;

pub const DEFAULT_OUT_DIR: &str = "./npm";

#[derive(Debug, Clone)]
pub struct PackageProfile {
    pub entry_points: Vec<String>,
    pub out_dir: PathBuf,
    pub test_pattern: String,
    pub shims: ShimOptions,
    pub compiler_options: CompilerOptions,
    pub mappings: ModuleMappings,
    pub manifest: ManifestTemplate,
    pub auxiliary_files: Vec<AuxiliaryFile>,
}

impl PackageProfile {
    pub fn s3_lite_client() -> Self {
        let manifest = ManifestTemplate::new(
            "@capgo/s3-lite-client",
            "This is a lightweight S3 client for Node.js and Deno.",
            "MIT",
            Repository {
                kind: "git".to_string(),
                url: "git+https://github.com/riderx/deno-s3-lite-client.git".to_string(),
            },
            Bugs {
                url: "https://github.com/riderx/deno-s3-lite-client/issues".to_string(),
            },
            Person {
                name: "Martin Donadieu".to_string(),
                url: Some("https://martin.solos.ventures/d".to_string()),
            },
        )
        .engine("node", ">=20")
        .contributor(
            "Braden MacDonald <martindonadieu@gmail.com> (https://github.com/bradenmacdonald/)",
        )
        .contributor(
            "Martin Donadieu <martindonadieu@gmail.com> (https://martin.solos.ventures/)",
        )
        .dev_dependency("@types/node", "^20.11.1")
        .keywords(["api", "lite", "amazon", "minio", "cloud", "s3", "storage"]);

        Self {
            entry_points: vec!["./mod.ts".to_string()],
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            test_pattern: "**/*(*.test|integration).{ts,tsx,js,mjs,jsx}".to_string(),
            shims: ShimOptions::dev_test_only(),
            compiler_options: CompilerOptions::with_lib(["ESNext", "DOM"]),
            mappings: ModuleMappings::declared(),
            manifest,
            auxiliary_files: vec![
                AuxiliaryFile::new("LICENSE", "LICENSE"),
                AuxiliaryFile::new("README.md", "README.md"),
            ],
        }
    }

    pub fn out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn build_options(&self, request: &BuildRequest) -> BuildOptions {
        BuildOptions {
            entry_points: self.entry_points.clone(),
            out_dir: self.out_dir.clone(),
            test_pattern: self.test_pattern.clone(),
            shims: self.shims.clone(),
            compiler_options: self.compiler_options.clone(),
            mappings: self.mappings.clone(),
            package: self.manifest.synthesize(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_fields_survive_version_bumps() {
        let profile = PackageProfile::s3_lite_client();
        let first = profile.build_options(&BuildRequest::from_arg(Some("1.0.0".into())).unwrap());
        let second = profile.build_options(&BuildRequest::from_arg(Some("2.0.0".into())).unwrap());

        assert_eq!(first.package.name, "@capgo/s3-lite-client");
        assert_eq!(first.package.name, second.package.name);
        assert_eq!(first.package.keywords, second.package.keywords);
        assert_eq!(first.package.version, "1.0.0");
        assert_eq!(second.package.version, "2.0.0");
    }

    #[test]
    fn test_declared_metadata() {
        let profile = PackageProfile::s3_lite_client();

        assert_eq!(profile.manifest.engines.get("node").map(String::as_str), Some(">=20"));
        assert_eq!(profile.manifest.contributors.len(), 2);
        assert_eq!(
            profile
                .build_options(&BuildRequest::from_arg(Some("1.0.0".into())).unwrap())
                .package
                .keywords,
            ["api", "lite", "amazon", "minio", "cloud", "s3", "storage"]
        );
        assert_eq!(profile.auxiliary_files.len(), 2);
    }

    #[test]
    fn test_out_dir_override() {
        let profile = PackageProfile::s3_lite_client().out_dir("dist/npm");
        let options = profile.build_options(&BuildRequest::from_arg(Some("1.0.0".into())).unwrap());
        assert_eq!(options.out_dir, PathBuf::from("dist/npm"));
    }
}
