//! Environment probing: configuration values derived from project state
//! rather than explicit user input.
//!
//! Covers absolute-path resolution, CSS-library detection from declared
//! dependencies, and upward discovery of an external bundler config file.
//! All filesystem lookups go through the [`FileProbe`] capability so
//! resolution stays a pure function of its inputs under test.

use std::path::{Path, PathBuf};

use crate::config::CssLibrary;
use crate::error::{MdxGoError, Result};
use crate::manifest::PackageManifest;

/// Bundler config file name discovered by upward search.
pub const BUNDLER_CONFIG_FILE_NAME: &str = "webpack.config.js";

// ---------------------------------------------------------------------------
// File probe capability
// ---------------------------------------------------------------------------

/// Minimal filesystem-existence capability.
///
/// Production code uses [`RealFiles`]; tests inject [`VirtualFiles`] so
/// resolution never touches the real filesystem.
pub trait FileProbe {
    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFiles;

impl FileProbe for RealFiles {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Probe backed by a fixed set of paths.
#[derive(Debug, Clone, Default)]
pub struct VirtualFiles {
    paths: Vec<PathBuf>,
}

impl VirtualFiles {
    /// Build a probe that reports exactly the given paths as existing.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl FileProbe for VirtualFiles {
    fn exists(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

/// Resolve `path` to an absolute path against `cwd`, normalizing `.` and
/// `..` components lexically.
///
/// No existence check and no symlink canonicalization happen here.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Search upward from `start` for a file named `file_name`.
///
/// Checks `start` itself, then each ancestor, returning the first hit.
pub fn find_up(file_name: &str, start: &Path, probe: &dyn FileProbe) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = d.join(file_name);
        if probe.exists(&candidate) {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}

// ---------------------------------------------------------------------------
// CSS library detection
// ---------------------------------------------------------------------------

/// Detect which CSS-in-JS library the project declares.
///
/// `styled-components` takes priority over `emotion` when both are present.
pub fn detect_css_library(manifest: Option<&PackageManifest>) -> Option<CssLibrary> {
    let manifest = manifest?;
    if manifest.declares("styled-components") {
        Some(CssLibrary::StyledComponents)
    } else if manifest.declares("emotion") {
        Some(CssLibrary::Emotion)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Bundler config discovery & load
// ---------------------------------------------------------------------------

/// An external bundler configuration, loaded before dispatch and passed
/// through to the collaborators opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlerConfig {
    /// Where the config was found (explicit flag or discovery).
    pub path: PathBuf,
    /// Raw file contents.
    pub source: String,
}

/// Locate the bundler config: an explicit `--webpack` path wins, otherwise
/// search upward from `cwd` for `webpack.config.js`.
pub fn discover_bundler_config(
    explicit: Option<&Path>,
    cwd: &Path,
    probe: &dyn FileProbe,
) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(absolutize(path, cwd)),
        None => find_up(BUNDLER_CONFIG_FILE_NAME, cwd, probe),
    }
}

/// Load a bundler config from disk.
///
/// A failed load is a fatal configuration error: it aborts the process
/// before any operation is dispatched.
pub fn load_bundler_config(path: &Path) -> Result<BundlerConfig> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        MdxGoError::config(format!(
            "failed to load bundler config {}: {e}",
            path.display()
        ))
    })?;

    tracing::debug!(?path, bytes = source.len(), "loaded bundler config");
    Ok(BundlerConfig {
        path: path.to_path_buf(),
        source,
    })
}
