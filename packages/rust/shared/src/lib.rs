//! Shared types, error model, and configuration resolution for mdx-go.
//!
//! This crate is the foundation depended on by the build and dev crates and
//! the CLI. It provides:
//! - [`MdxGoError`] — the unified error type
//! - [`PackageManifest`] — the nearest `package.json`, loaded once
//! - Configuration layers and the resolver ([`ConfigLayers`], [`resolve`],
//!   [`ResolvedConfig`])
//! - The environment probe ([`FileProbe`], CSS-library detection,
//!   bundler-config discovery)

pub mod config;
pub mod error;
pub mod manifest;
pub mod probe;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ConfigLayer, ConfigLayers, CssLibrary, EnvironmentDerived, ResolvedConfig, resolve,
};
pub use error::{MdxGoError, Result};
pub use manifest::{CONFIG_BLOCK_KEY, MANIFEST_FILE_NAME, PackageManifest, load_manifest};
pub use probe::{
    BUNDLER_CONFIG_FILE_NAME, BundlerConfig, FileProbe, RealFiles, VirtualFiles, absolutize,
    detect_css_library, discover_bundler_config, find_up, load_bundler_config,
};
