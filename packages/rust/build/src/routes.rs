//! Route derivation: mapping document files under the input directory to
//! site routes.
//!
//! `index.mdx` (or `index.md`) maps to `/`; any other file maps to its
//! extension-less path, nested directories preserved. Hidden directories,
//! `node_modules`, and the output directory are never descended into.

use std::path::{Path, PathBuf};

use mdxgo_shared::{MdxGoError, Result};

/// Document file extensions recognized as routes.
const DOC_EXTENSIONS: [&str; 2] = ["mdx", "md"];

/// One routable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Site route, always starting with `/`.
    pub route: String,
    /// Document path relative to the input directory.
    pub rel_path: PathBuf,
    /// Absolute path of the source file.
    pub file: PathBuf,
}

impl Route {
    /// Output file for this route inside the export directory
    /// (`/` → `index.html`, `/guides/setup` → `guides/setup/index.html`).
    pub fn output_file(&self) -> PathBuf {
        if self.route == "/" {
            PathBuf::from("index.html")
        } else {
            PathBuf::from(self.route.trim_start_matches('/')).join("index.html")
        }
    }
}

/// Derive the route for a document path relative to the input directory.
pub fn route_for(rel_path: &Path) -> String {
    let mut segments: Vec<String> = rel_path
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    let stem = rel_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem != "index" {
        segments.push(stem);
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Whether a directory entry should be descended into.
fn is_walkable_dir(path: &Path, out_dir: &Path) -> bool {
    if path == out_dir {
        return false;
    }
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => !name.starts_with('.') && name != "node_modules",
        None => false,
    }
}

/// Whether a file is a routable document.
fn is_doc_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| DOC_EXTENSIONS.contains(&ext))
}

/// Collect all routable documents under `dirname`, sorted by route.
///
/// The input directory must exist; this is where a bad positional path
/// finally surfaces, as an operation failure.
pub fn collect_routes(dirname: &Path, out_dir: &Path) -> Result<Vec<Route>> {
    if !dirname.is_dir() {
        return Err(MdxGoError::Build(format!(
            "input directory not found: {}",
            dirname.display()
        )));
    }

    let mut routes = Vec::new();
    walk(dirname, dirname, out_dir, &mut routes)?;
    routes.sort_by(|a, b| a.route.cmp(&b.route));
    Ok(routes)
}

fn walk(root: &Path, dir: &Path, out_dir: &Path, routes: &mut Vec<Route>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| MdxGoError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| MdxGoError::io(dir, e))?;
        let path = entry.path();

        if path.is_dir() {
            if is_walkable_dir(&path, out_dir) {
                walk(root, &path, out_dir, routes)?;
            }
        } else if is_doc_file(&path) {
            let rel_path = path
                .strip_prefix(root)
                .expect("walked path is under root")
                .to_path_buf();
            routes.push(Route {
                route: route_for(&rel_path),
                rel_path,
                file: path,
            });
        }
    }

    Ok(())
}
