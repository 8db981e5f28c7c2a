//! Static export pipeline: input directory → routes → rendered pages →
//! assets → route manifest.
//!
//! This is the `build` collaborator invoked by the CLI with a resolved
//! configuration. It performs exactly one export per invocation and either
//! succeeds with an [`ExportResult`] or fails with an [`MdxGoError`].

pub mod render;
pub mod routes;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, instrument};

use mdxgo_shared::{MdxGoError, ResolvedConfig, Result};

pub use render::{page_title, render_page};
pub use routes::{Route, collect_routes, route_for};

/// Asset directory copied verbatim into the export, when present.
const PUBLIC_DIR_NAME: &str = "public";

/// Result of a successful static export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Absolute output directory.
    pub out_dir: PathBuf,
    /// Number of pages written.
    pub page_count: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Export the documents under `config.dirname` into `config.out_dir`.
///
/// 1. Collect routes
/// 2. Render one HTML page per route
/// 3. Copy `public/` assets
/// 4. Write `routes.json`
#[instrument(skip_all, fields(dirname = %config.dirname.display(), out_dir = %config.out_dir.display()))]
pub async fn export(config: &ResolvedConfig) -> Result<ExportResult> {
    let start = Instant::now();

    let routes = collect_routes(&config.dirname, &config.out_dir)?;
    if routes.is_empty() {
        return Err(MdxGoError::Build(format!(
            "no .mdx or .md documents found under {}",
            config.dirname.display()
        )));
    }

    info!(
        pages = routes.len(),
        css_library = ?config.css_library,
        "exporting documents"
    );

    std::fs::create_dir_all(&config.out_dir)
        .map_err(|e| MdxGoError::io(&config.out_dir, e))?;

    for route in &routes {
        write_route(route, config)?;
    }

    let public_dir = config.dirname.join(PUBLIC_DIR_NAME);
    if public_dir.is_dir() {
        debug!(path = %public_dir.display(), "copying public assets");
        copy_dir_all(&public_dir, &config.out_dir)?;
    }

    write_route_manifest(&config.out_dir, &routes)?;

    let result = ExportResult {
        out_dir: config.out_dir.clone(),
        page_count: routes.len(),
        elapsed: start.elapsed(),
    };

    info!(
        page_count = result.page_count,
        elapsed_ms = result.elapsed.as_millis(),
        "export complete"
    );

    Ok(result)
}

/// Render one route and write it into the output directory.
fn write_route(route: &Route, config: &ResolvedConfig) -> Result<()> {
    let source =
        std::fs::read_to_string(&route.file).map_err(|e| MdxGoError::io(&route.file, e))?;

    let fallback = route
        .rel_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string());
    let title = page_title(&source, &fallback);

    let html = render_page(&title, &source, config, false)?;

    let out_file = config.out_dir.join(route.output_file());
    if let Some(parent) = out_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MdxGoError::io(parent, e))?;
    }
    std::fs::write(&out_file, html).map_err(|e| MdxGoError::io(&out_file, e))?;

    debug!(route = %route.route, file = %out_file.display(), "wrote page");
    Ok(())
}

/// Write `routes.json`: the route list plus generator metadata.
fn write_route_manifest(out_dir: &Path, routes: &[Route]) -> Result<()> {
    let manifest = serde_json::json!({
        "generator": "mdx-go",
        "version": env!("CARGO_PKG_VERSION"),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "routes": routes.iter().map(|r| &r.route).collect::<Vec<_>>(),
    });

    let path = out_dir.join("routes.json");
    let content = serde_json::to_string_pretty(&manifest)
        .map_err(|e| MdxGoError::Build(format!("routes.json serialization: {e}")))?;
    std::fs::write(&path, content).map_err(|e| MdxGoError::io(&path, e))
}

/// Recursively copy `from` into `to`, creating directories as needed.
fn copy_dir_all(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to).map_err(|e| MdxGoError::io(to, e))?;

    for entry in std::fs::read_dir(from).map_err(|e| MdxGoError::io(from, e))? {
        let entry = entry.map_err(|e| MdxGoError::io(from, e))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());

        if src.is_dir() {
            copy_dir_all(&src, &dst)?;
        } else {
            std::fs::copy(&src, &dst).map_err(|e| MdxGoError::io(&src, e))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(dirname: &Path, out_dir: &Path) -> ResolvedConfig {
        ResolvedConfig {
            dirname: dirname.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
            pkg: None,
            basename: String::new(),
            webpack: None,
            css_library: None,
            port: 8080,
            open: true,
            static_export: false,
            fullscreen: false,
        }
    }

    #[tokio::test]
    async fn export_writes_pages_and_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(docs.join("guides")).expect("mkdir");
        std::fs::write(docs.join("index.mdx"), "# Home\n\nWelcome.").expect("write");
        std::fs::write(docs.join("guides/setup.md"), "# Setup").expect("write");

        let out = dir.path().join("dist");
        let result = export(&config_for(&docs, &out)).await.expect("export");

        assert_eq!(result.page_count, 2);
        assert!(out.join("index.html").exists());
        assert!(out.join("guides/setup/index.html").exists());

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("routes.json")).expect("read"))
                .expect("parse routes.json");
        assert_eq!(manifest["generator"], "mdx-go");
        assert_eq!(manifest["routes"].as_array().expect("routes").len(), 2);
    }

    #[tokio::test]
    async fn export_copies_public_assets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(docs.join("public/img")).expect("mkdir");
        std::fs::write(docs.join("index.md"), "# Home").expect("write");
        std::fs::write(docs.join("public/img/logo.svg"), "<svg/>").expect("write");

        let out = dir.path().join("dist");
        export(&config_for(&docs, &out)).await.expect("export");

        assert!(out.join("img/logo.svg").exists());
    }

    #[tokio::test]
    async fn export_fails_on_empty_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).expect("mkdir");

        let out = dir.path().join("dist");
        let err = export(&config_for(&docs, &out))
            .await
            .expect_err("should fail");
        assert!(matches!(err, MdxGoError::Build(_)));
    }

    #[tokio::test]
    async fn export_fails_on_missing_input_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let docs = dir.path().join("no-such-docs");
        let out = dir.path().join("dist");

        let err = export(&config_for(&docs, &out))
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("input directory not found"));
    }
}
