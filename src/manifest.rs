use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::version::BuildRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bugs {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The npm `package.json` fields the compiler writes out verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub license: String,
    pub repository: Repository,
    pub bugs: Bugs,
    pub engines: BTreeMap<String, String>,
    pub author: Person,
    pub contributors: Vec<String>,
    pub dev_dependencies: BTreeMap<String, String>,
    pub keywords: Vec<String>,
}

/// Every manifest field except the version, fixed at design time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestTemplate {
    pub name: String,
    pub description: String,
    pub license: String,
    pub repository: Repository,
    pub bugs: Bugs,
    pub engines: BTreeMap<String, String>,
    pub author: Person,
    pub contributors: Vec<String>,
    pub dev_dependencies: BTreeMap<String, String>,
    keywords: Vec<String>,
}

impl ManifestTemplate {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        license: impl Into<String>,
        repository: Repository,
        bugs: Bugs,
        author: Person,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            license: license.into(),
            repository,
            bugs,
            engines: BTreeMap::new(),
            author,
            contributors: Vec::new(),
            dev_dependencies: BTreeMap::new(),
            keywords: Vec::new(),
        }
    }

    pub fn engine(mut self, engine: &str, range: &str) -> Self {
        self.engines.insert(engine.to_string(), range.to_string());
        self
    }

    pub fn contributor(mut self, contributor: &str) -> Self {
        self.contributors.push(contributor.to_string());
        self
    }

    pub fn dev_dependency(mut self, package: &str, range: &str) -> Self {
        self.dev_dependencies
            .insert(package.to_string(), range.to_string());
        self
    }

    /// Adds discovery keywords, skipping any already present.
    pub fn keywords<'a>(mut self, keywords: impl IntoIterator<Item = &'a str>) -> Self {
        for keyword in keywords {
            if !self.keywords.iter().any(|k| k == keyword) {
                self.keywords.push(keyword.to_string());
            }
        }
        self
    }

    pub fn synthesize(&self, request: &BuildRequest) -> PackageManifest {
        PackageManifest {
            name: self.name.clone(),
            version: request.version().to_string(),
            description: self.description.clone(),
            license: self.license.clone(),
            repository: self.repository.clone(),
            bugs: self.bugs.clone(),
            engines: self.engines.clone(),
            author: self.author.clone(),
            contributors: self.contributors.clone(),
            dev_dependencies: self.dev_dependencies.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

/// The identifying part of a `package.json` found on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct EmittedManifest {
    pub name: String,
    pub version: String,
}

pub fn read_manifest(manifest_path: &Path) -> Result<EmittedManifest> {
    let manifest_content = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read manifest from {}", manifest_path.display()))?;

    let manifest: EmittedManifest =
        serde_json::from_str(&manifest_content).with_context(|| {
            format!("Failed to parse manifest JSON from {}", manifest_path.display())
        })?;

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn template() -> ManifestTemplate {
        ManifestTemplate::new(
            "@scope/pkg",
            "A package.",
            "MIT",
            Repository {
                kind: "git".to_string(),
                url: "git+https://example.com/pkg.git".to_string(),
            },
            Bugs {
                url: "https://example.com/pkg/issues".to_string(),
            },
            Person {
                name: "Jane Doe".to_string(),
                url: None,
            },
        )
        .engine("node", ">=20")
        .dev_dependency("@types/node", "^20.11.1")
        .keywords(["s3", "storage", "s3"])
    }

    #[test]
    fn test_manifest_synthesis() {
        let request = BuildRequest::from_arg(Some("1.0.0-rc.1".to_string())).unwrap();
        let manifest = template().synthesize(&request);

        assert_eq!(manifest.name, "@scope/pkg");
        assert_eq!(manifest.version, "1.0.0-rc.1");
        assert_eq!(manifest.keywords, vec!["s3", "storage"]);
    }

    #[test]
    fn test_manifest_json_keys() {
        let request = BuildRequest::from_arg(Some("1.0.0".to_string())).unwrap();
        let value = serde_json::to_value(template().synthesize(&request)).unwrap();

        assert_eq!(value["version"], "1.0.0");
        assert_eq!(value["repository"]["type"], "git");
        assert_eq!(value["engines"]["node"], ">=20");
        assert_eq!(value["devDependencies"]["@types/node"], "^20.11.1");
        assert!(value["author"].get("url").is_none());
    }

    #[test]
    fn test_read_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        fs::write(
            &path,
            r#"{ "name": "@scope/pkg", "version": "2.3.1", "main": "./script/mod.js" }"#,
        )
        .unwrap();

        let manifest = read_manifest(&path).unwrap();
        assert_eq!(manifest.name, "@scope/pkg");
        assert_eq!(manifest.version, "2.3.1");

        assert!(read_manifest(&temp.path().join("missing.json")).is_err());
    }
}
