use serde::{Deserialize, Serialize};

pub const DEFAULT_CORE_MODULE: &str = "@angular/core";
pub const DEFAULT_CORE_ALIAS: &str = "i0";

/// Options for a compilation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Identifier the runtime instruction module is bound to in emitted code.
    pub core_alias: String,
    /// Module specifier recorded on runtime references.
    pub core_module: String,
    /// Treat expression syntax errors as fatal to the enclosing definition.
    pub strict: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            core_alias: DEFAULT_CORE_ALIAS.to_string(),
            core_module: DEFAULT_CORE_MODULE.to_string(),
            strict: false,
        }
    }
}

impl CompilerConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
