use serde::{Serialize, Serializer};

/// How a runtime-native global is substituted in the compiled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShimMode {
    /// Shim everywhere, library code included.
    Full,
    /// Shim only in code recognised as tests.
    Dev,
}

impl Serialize for ShimMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ShimMode::Full => serializer.serialize_bool(true),
            ShimMode::Dev => serializer.serialize_str("dev"),
        }
    }
}

/// Per-capability shims for the `Deno` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenoShim {
    /// `Deno.test` declarations.
    pub test: ShimMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShimOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deno: Option<DenoShim>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timers: Option<ShimMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ShimMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<ShimMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto: Option<ShimMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undici: Option<ShimMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_socket: Option<ShimMode>,
}

impl ShimOptions {
    /// Test declarations keep working under a Node test runner; library code
    /// gets no shims.
    pub fn dev_test_only() -> Self {
        Self {
            deno: Some(DenoShim {
                test: ShimMode::Dev,
            }),
            ..Self::default()
        }
    }
}
