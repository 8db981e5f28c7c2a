//! Dev server: serves the documents under the input directory with live
//! reload.
//!
//! This is the `dev` collaborator invoked by the CLI with a resolved
//! configuration. Documents are rendered on request (always fresh); a
//! filesystem watcher bumps a version counter that rendered pages poll via
//! `/__mdx_go__/version`, reloading the page when it changes. Static assets
//! fall back to the input directory itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use mdxgo_build::render::{page_title, render_page};
use mdxgo_shared::{MdxGoError, ResolvedConfig, Result};

/// Path of the live-reload version probe.
const VERSION_PROBE_PATH: &str = "/__mdx_go__/version";

// ---------------------------------------------------------------------------
// Server handle
// ---------------------------------------------------------------------------

/// A running dev server.
///
/// The success value of a `dev` dispatch: exposes the actually-bound
/// address (the configured port may be 0 for an ephemeral one) and a handle
/// to await the serving task.
#[derive(Debug)]
pub struct DevServer {
    local_addr: std::net::SocketAddr,
    handle: JoinHandle<Result<()>>,
    // Dropping the watcher stops change notifications, so it lives as long
    // as the server handle.
    _watcher: Option<RecommendedWatcher>,
}

impl DevServer {
    /// The address the listener actually bound.
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    /// Ready-to-use local URL for this server.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.local_addr.port())
    }

    /// Await the serving task until it stops or fails.
    pub async fn wait(self) -> Result<()> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(MdxGoError::Server(format!("server task failed: {e}"))),
        }
    }

    /// Stop the serving task.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Serve
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    config: Arc<ResolvedConfig>,
    version: Arc<AtomicU64>,
}

/// Bind and start the dev server for the resolved configuration.
///
/// Returns as soon as the listener is bound; serving continues on a
/// background task owned by the returned [`DevServer`].
pub async fn serve(config: &ResolvedConfig) -> Result<DevServer> {
    if !config.dirname.is_dir() {
        return Err(MdxGoError::Server(format!(
            "input directory not found: {}",
            config.dirname.display()
        )));
    }

    let listener = TcpListener::bind(("127.0.0.1", config.port))
        .await
        .map_err(|e| {
            MdxGoError::Server(format!("failed to bind 127.0.0.1:{}: {e}", config.port))
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| MdxGoError::Server(format!("local_addr: {e}")))?;

    let version = Arc::new(AtomicU64::new(0));
    let watcher = watch_docs(&config.dirname, version.clone());

    let state = AppState {
        config: Arc::new(config.clone()),
        version,
    };

    // Rendered pages poll the probe under the basename, so it must be
    // routable at the prefixed path as well.
    let mut app = Router::new().route(VERSION_PROBE_PATH, get(version_probe));
    if config.basename.starts_with('/') {
        let prefixed = format!("{}{VERSION_PROBE_PATH}", config.basename);
        app = app.route(&prefixed, get(version_probe));
    }
    let app = app.fallback(serve_page).with_state(state);

    info!(addr = %local_addr, dirname = %config.dirname.display(), "dev server listening");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .map_err(|e| MdxGoError::Server(format!("serve failed: {e}")))
    });

    Ok(DevServer {
        local_addr,
        handle,
        _watcher: watcher,
    })
}

/// Watch the docs directory, bumping the version counter on any change.
///
/// A watcher failure degrades to no live reload; it never fails the dev
/// operation itself.
fn watch_docs(dirname: &Path, version: Arc<AtomicU64>) -> Option<RecommendedWatcher> {
    let result = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            version.fetch_add(1, Ordering::SeqCst);
        }
    });

    match result {
        Ok(mut watcher) => match watcher.watch(dirname, RecursiveMode::Recursive) {
            Ok(()) => {
                debug!(path = %dirname.display(), "watching for changes");
                Some(watcher)
            }
            Err(e) => {
                warn!(path = %dirname.display(), error = %e, "file watching unavailable");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "file watching unavailable");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn version_probe(State(state): State<AppState>) -> String {
    state.version.load(Ordering::SeqCst).to_string()
}

/// Render a document for the request path, falling back to static files
/// from the input directory.
async fn serve_page(State(state): State<AppState>, req: Request) -> Response {
    let path = req.uri().path().to_string();
    let route = if state.config.basename.is_empty() {
        path.as_str()
    } else {
        path.strip_prefix(state.config.basename.as_str())
            .unwrap_or(path.as_str())
    };

    if let Some(file) = doc_file_for(&state.config.dirname, route) {
        return match render_doc(&state.config, &file) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                warn!(file = %file.display(), error = %e, "failed to render document");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        };
    }

    let mut assets = ServeDir::new(&state.config.dirname);
    match assets.try_call(req).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

fn render_doc(config: &ResolvedConfig, file: &Path) -> Result<String> {
    let source = std::fs::read_to_string(file).map_err(|e| MdxGoError::io(file, e))?;
    let fallback = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string());
    let title = page_title(&source, &fallback);
    render_page(&title, &source, config, true)
}

/// Map a request path to a document file, if one exists.
///
/// `/` → `index.mdx`/`index.md`; `/guides/setup` → `guides/setup.{mdx,md}`
/// or `guides/setup/index.{mdx,md}`. Traversal segments are rejected.
fn doc_file_for(dirname: &Path, request_path: &str) -> Option<PathBuf> {
    let mut rel = PathBuf::new();
    for segment in request_path.split('/') {
        let segment = segment.trim();
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return None;
        }
        rel.push(segment);
    }

    let candidates: Vec<PathBuf> = if rel.as_os_str().is_empty() {
        vec![dirname.join("index.mdx"), dirname.join("index.md")]
    } else {
        let base = dirname.join(&rel);
        vec![
            base.with_extension("mdx"),
            base.with_extension("md"),
            base.join("index.mdx"),
            base.join("index.md"),
        ]
    };

    candidates.into_iter().find(|c| c.is_file())
}
