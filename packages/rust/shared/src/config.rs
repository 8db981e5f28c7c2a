//! Configuration layers and resolution for mdx-go.
//!
//! Settings come from three layers merged in increasing precedence: tool
//! defaults, the `"mdx-go"` block of the nearest `package.json`, and CLI
//! flags. Environment-derived values (input directory, loaded bundler
//! config, detected CSS library) always win for their keys since they are
//! not user-settable through the layers. The merge is a shallow key-wise
//! override. Resolution is a pure function of (working directory, flags,
//! manifest, probed files) and is idempotent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MdxGoError, Result};
use crate::manifest::{CONFIG_BLOCK_KEY, PackageManifest};
use crate::probe::{BundlerConfig, absolutize};

// ---------------------------------------------------------------------------
// CSS library
// ---------------------------------------------------------------------------

/// CSS-in-JS library detected among the project's declared dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CssLibrary {
    #[serde(rename = "styled-components")]
    StyledComponents,
    #[serde(rename = "emotion")]
    Emotion,
}

impl std::fmt::Display for CssLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StyledComponents => write!(f, "styled-components"),
            Self::Emotion => write!(f, "emotion"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration layers
// ---------------------------------------------------------------------------

/// One layer of overridable settings. `None` means "this layer does not
/// define the key"; a defined key entirely replaces the same key in any
/// lower layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    /// Dev server port.
    pub port: Option<u16>,
    /// Auto-open the browser once the dev server is ready.
    pub open: Option<bool>,
    /// Output directory for static export.
    pub out_dir: Option<PathBuf>,
    /// Routing base path.
    pub basename: Option<String>,
    /// Disable the client script in exports.
    #[serde(rename = "static")]
    pub static_export: Option<bool>,
    /// Explicit bundler config path (overrides discovery).
    pub webpack: Option<PathBuf>,
    /// Disable the centered page layout.
    pub fullscreen: Option<bool>,
}

impl ConfigLayer {
    /// The lowest-precedence layer: every key defined with its built-in
    /// default.
    pub fn tool_defaults() -> Self {
        Self {
            port: Some(8080),
            open: Some(true),
            out_dir: Some(PathBuf::from("dist")),
            basename: Some(String::new()),
            static_export: Some(false),
            webpack: None,
            fullscreen: Some(false),
        }
    }

    /// Overlay `higher` on top of this layer: keys defined by `higher` win.
    pub fn overlay(self, higher: Self) -> Self {
        Self {
            port: higher.port.or(self.port),
            open: higher.open.or(self.open),
            out_dir: higher.out_dir.or(self.out_dir),
            basename: higher.basename.or(self.basename),
            static_export: higher.static_export.or(self.static_export),
            webpack: higher.webpack.or(self.webpack),
            fullscreen: higher.fullscreen.or(self.fullscreen),
        }
    }

    /// Parse a layer from the manifest's `"mdx-go"` block.
    ///
    /// Unrecognized keys are warned about by name and ignored; the set of
    /// recognized keys is closed.
    pub fn from_config_block(value: &serde_json::Value) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawBlock {
            #[serde(flatten)]
            layer: ConfigLayer,
            #[serde(flatten)]
            unknown: BTreeMap<String, serde_json::Value>,
        }

        let raw: RawBlock = serde_json::from_value(value.clone()).map_err(|e| {
            MdxGoError::config(format!(
                "invalid {CONFIG_BLOCK_KEY:?} block in package.json: {e}"
            ))
        })?;

        for key in raw.unknown.keys() {
            tracing::warn!(
                key,
                "ignoring unrecognized key in {} config block",
                CONFIG_BLOCK_KEY
            );
        }

        Ok(raw.layer)
    }
}

/// The ordered configuration layers, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    pub defaults: ConfigLayer,
    pub project: ConfigLayer,
    pub cli: ConfigLayer,
}

impl ConfigLayers {
    /// Assemble the three layers. An absent project block is an empty
    /// layer, never an error.
    pub fn load(block: Option<&serde_json::Value>, cli: ConfigLayer) -> Result<Self> {
        let project = match block {
            Some(value) => ConfigLayer::from_config_block(value)?,
            None => ConfigLayer::default(),
        };

        Ok(Self {
            defaults: ConfigLayer::tool_defaults(),
            project,
            cli,
        })
    }

    /// Shallow key-wise merge, highest-precedence definition winning.
    pub fn merged(&self) -> ConfigLayer {
        self.defaults
            .clone()
            .overlay(self.project.clone())
            .overlay(self.cli.clone())
    }
}

// ---------------------------------------------------------------------------
// Environment-derived values
// ---------------------------------------------------------------------------

/// Values computed by the environment probe. These take precedence over
/// every layer for their respective keys.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentDerived {
    /// Absolute input directory.
    pub dirname: PathBuf,
    /// Loaded bundler config (explicit flag or discovered file).
    pub webpack: Option<BundlerConfig>,
    /// Detected CSS-in-JS library.
    pub css_library: Option<CssLibrary>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// The single immutable record passed to a dispatched operation.
///
/// `dirname` and `out_dir` are always absolute, resolved against the
/// working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Absolute input directory containing the documents.
    pub dirname: PathBuf,
    /// Absolute output directory for static export.
    pub out_dir: PathBuf,
    /// The nearest package manifest, if any.
    pub pkg: Option<PackageManifest>,
    /// Routing base path (default empty).
    pub basename: String,
    /// Loaded bundler config, passed through opaquely.
    pub webpack: Option<BundlerConfig>,
    /// Detected CSS-in-JS library.
    pub css_library: Option<CssLibrary>,
    /// Dev server port.
    pub port: u16,
    /// Auto-open the browser once the dev server is ready.
    pub open: bool,
    /// Disable the client script in exports.
    pub static_export: bool,
    /// Disable the centered page layout.
    pub fullscreen: bool,
}

/// Merge the layers and environment-derived values into the final record.
///
/// The defaults layer defines every key, so the unwraps after merging can
/// never fire in practice; `unwrap_or` defaults are kept identical anyway.
pub fn resolve(
    layers: &ConfigLayers,
    derived: EnvironmentDerived,
    pkg: Option<PackageManifest>,
    cwd: &Path,
) -> ResolvedConfig {
    let merged = layers.merged();

    let out_dir = merged.out_dir.unwrap_or_else(|| PathBuf::from("dist"));

    ResolvedConfig {
        dirname: absolutize(&derived.dirname, cwd),
        out_dir: absolutize(&out_dir, cwd),
        pkg,
        basename: merged.basename.unwrap_or_default(),
        webpack: derived.webpack,
        css_library: derived.css_library,
        port: merged.port.unwrap_or(8080),
        open: merged.open.unwrap_or(true),
        static_export: merged.static_export.unwrap_or(false),
        fullscreen: merged.fullscreen.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layers_with(project: ConfigLayer, cli: ConfigLayer) -> ConfigLayers {
        ConfigLayers {
            defaults: ConfigLayer::tool_defaults(),
            project,
            cli,
        }
    }

    #[test]
    fn defaults_apply_when_no_overrides() {
        let layers = layers_with(ConfigLayer::default(), ConfigLayer::default());
        let config = resolve(&layers, EnvironmentDerived::default(), None, Path::new("/proj"));

        assert_eq!(config.port, 8080);
        assert!(config.open);
        assert!(!config.static_export);
        assert!(!config.fullscreen);
        assert_eq!(config.basename, "");
        assert_eq!(config.out_dir, PathBuf::from("/proj/dist"));
    }

    #[test]
    fn project_block_overrides_defaults() {
        let project = ConfigLayer {
            port: Some(3000),
            ..Default::default()
        };
        let layers = layers_with(project, ConfigLayer::default());
        let config = resolve(&layers, EnvironmentDerived::default(), None, Path::new("/proj"));

        assert_eq!(config.port, 3000);
    }

    #[test]
    fn explicit_cli_flag_wins_over_project_block() {
        let project = ConfigLayer {
            port: Some(3000),
            out_dir: Some(PathBuf::from("site")),
            ..Default::default()
        };
        let cli = ConfigLayer {
            port: Some(4000),
            ..Default::default()
        };
        let layers = layers_with(project, cli);
        let config = resolve(&layers, EnvironmentDerived::default(), None, Path::new("/proj"));

        // CLI wins only where it explicitly defines a key; the project
        // block still wins elsewhere.
        assert_eq!(config.port, 4000);
        assert_eq!(config.out_dir, PathBuf::from("/proj/site"));
    }

    #[test]
    fn out_dir_is_absolutized_against_cwd() {
        let layers = layers_with(ConfigLayer::default(), ConfigLayer::default());
        let derived = EnvironmentDerived {
            dirname: PathBuf::from("docs"),
            ..Default::default()
        };
        let config = resolve(&layers, derived, None, Path::new("/proj"));

        assert_eq!(config.out_dir, PathBuf::from("/proj/dist"));
        assert_eq!(config.dirname, PathBuf::from("/proj/docs"));
        assert!(config.out_dir.is_absolute());
        assert!(config.dirname.is_absolute());
    }

    #[test]
    fn environment_derived_css_library_wins() {
        let layers = layers_with(ConfigLayer::default(), ConfigLayer::default());
        let derived = EnvironmentDerived {
            css_library: Some(CssLibrary::StyledComponents),
            ..Default::default()
        };
        let config = resolve(&layers, derived, None, Path::new("/proj"));

        assert_eq!(config.css_library, Some(CssLibrary::StyledComponents));
    }

    #[test]
    fn config_block_parses_known_keys() {
        let block = json!({
            "port": 3000,
            "outDir": "site",
            "static": true
        });
        let layer = ConfigLayer::from_config_block(&block).expect("parse block");

        assert_eq!(layer.port, Some(3000));
        assert_eq!(layer.out_dir, Some(PathBuf::from("site")));
        assert_eq!(layer.static_export, Some(true));
        assert_eq!(layer.open, None);
    }

    #[test]
    fn config_block_ignores_unknown_keys() {
        let block = json!({
            "port": 3000,
            "theme": "dark",
            "plugins": ["x"]
        });
        let layer = ConfigLayer::from_config_block(&block).expect("parse block");

        assert_eq!(layer.port, Some(3000));
    }

    #[test]
    fn invalid_config_block_names_the_block() {
        let err = ConfigLayer::from_config_block(&json!("not an object"))
            .expect_err("should fail");
        assert!(err.to_string().contains(CONFIG_BLOCK_KEY));
    }

    #[test]
    fn resolution_is_idempotent() {
        let project = ConfigLayer {
            basename: Some("/docs".into()),
            ..Default::default()
        };
        let make = || {
            let layers = layers_with(project.clone(), ConfigLayer::default());
            let derived = EnvironmentDerived {
                dirname: PathBuf::from("docs"),
                css_library: Some(CssLibrary::Emotion),
                ..Default::default()
            };
            resolve(&layers, derived, None, Path::new("/proj"))
        };

        assert_eq!(make(), make());
    }
}
