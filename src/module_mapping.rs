use serde::Serialize;
use std::collections::BTreeMap;

/// Where a module identifier should point in the compiled package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedSpecifier {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
}

impl MappedSpecifier {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            sub_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModuleMappings {
    redirects: BTreeMap<String, MappedSpecifier>,
}

impl ModuleMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirections declared for this package.
    pub fn declared() -> Self {
        let mut mappings = Self::new();

        // Web streams keep their Node-native identifier.
        mappings.insert("node:stream/web", MappedSpecifier::named("node:stream/web"));

        mappings
    }

    pub fn insert(&mut self, specifier: impl Into<String>, target: MappedSpecifier) {
        self.redirects.insert(specifier.into(), target);
    }

    pub fn specifiers(&self) -> Vec<&str> {
        self.redirects.keys().map(|s| s.as_str()).collect()
    }
}
