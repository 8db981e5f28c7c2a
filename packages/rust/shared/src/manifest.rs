//! Package manifest (`package.json`) loading for mdx-go.
//!
//! The nearest manifest above the working directory supplies the project
//! name, the declared dependencies (used for CSS library detection), and an
//! optional `"mdx-go"` configuration block. Loaded once per invocation,
//! read-only thereafter. A missing manifest is not an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MdxGoError, Result};
use crate::probe::{FileProbe, find_up};

/// Manifest file name searched for upward from the working directory.
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Key of the tool-specific config block inside the manifest.
pub const CONFIG_BLOCK_KEY: &str = "mdx-go";

/// The subset of `package.json` mdx-go reads. Everything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name.
    #[serde(default)]
    pub name: Option<String>,

    /// Package version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Declared runtime dependencies, name → version requirement.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// The raw `"mdx-go"` config block, interpreted later by the
    /// configuration layer loader.
    #[serde(
        default,
        rename = "mdx-go",
        skip_serializing_if = "Option::is_none"
    )]
    pub config_block: Option<serde_json::Value>,
}

impl PackageManifest {
    /// Whether a dependency with the given name is declared.
    pub fn declares(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }
}

/// Locate the nearest `package.json` at or above `start`.
pub fn find_manifest(start: &Path, probe: &dyn FileProbe) -> Option<PathBuf> {
    find_up(MANIFEST_FILE_NAME, start, probe)
}

/// Load the manifest nearest to `start`. Returns `None` when no
/// `package.json` exists anywhere above it.
pub fn load_manifest(start: &Path, probe: &dyn FileProbe) -> Result<Option<PackageManifest>> {
    match find_manifest(start, probe) {
        Some(path) => {
            tracing::debug!(?path, "loading package manifest");
            load_manifest_from(&path).map(Some)
        }
        None => {
            tracing::debug!(?start, "no package.json found, continuing without one");
            Ok(None)
        }
    }
}

/// Load and parse a manifest from a specific file path.
pub fn load_manifest_from(path: &Path) -> Result<PackageManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| MdxGoError::io(path, e))?;

    serde_json::from_str(&content).map_err(|e| {
        MdxGoError::manifest(format!("failed to parse {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::VirtualFiles;

    #[test]
    fn manifest_parses_known_fields() {
        let json = r#"{
            "name": "my-docs",
            "version": "1.2.3",
            "dependencies": {
                "styled-components": "^4.0.0",
                "react": "^16.8.0"
            },
            "scripts": { "start": "mdx-go docs" },
            "mdx-go": { "outDir": "site" }
        }"#;

        let manifest: PackageManifest = serde_json::from_str(json).expect("parse manifest");
        assert_eq!(manifest.name.as_deref(), Some("my-docs"));
        assert!(manifest.declares("styled-components"));
        assert!(!manifest.declares("emotion"));
        assert!(manifest.config_block.is_some());
    }

    #[test]
    fn manifest_without_block_or_deps() {
        let manifest: PackageManifest =
            serde_json::from_str(r#"{"name": "bare"}"#).expect("parse");
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.config_block.is_none());
    }

    #[test]
    fn find_manifest_walks_upward() {
        let probe = VirtualFiles::new(["/proj/package.json"]);
        let found = find_manifest(Path::new("/proj/docs/guides"), &probe);
        assert_eq!(found, Some(PathBuf::from("/proj/package.json")));
    }

    #[test]
    fn find_manifest_none_when_absent() {
        let probe = VirtualFiles::default();
        assert!(find_manifest(Path::new("/proj/docs"), &probe).is_none());
    }
}
