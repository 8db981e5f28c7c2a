//! CLI flag definitions, positional interpretation, command dispatch, and
//! outcome reporting.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use mdxgo_shared::{
    ConfigLayer, ConfigLayers, EnvironmentDerived, RealFiles, ResolvedConfig, detect_css_library,
    discover_bundler_config, load_bundler_config, load_manifest, resolve,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// mdx-go — documentation sites from a directory of MDX/Markdown files.
#[derive(Parser, Debug)]
#[command(
    name = "mdx-go",
    version,
    about = "Build and serve documentation sites from MDX/Markdown files.",
    after_help = "Examples:\n  mdx-go docs\n  mdx-go build docs\n\nUse -V/--version to print the version; -v raises log verbosity.",
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command (`build` or `dev`), or the docs directory itself.
    #[arg(value_name = "COMMAND|PATH")]
    pub command: Option<String>,

    /// Docs directory (defaults to the current directory).
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Dev server port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Open the browser once the dev server is ready.
    #[arg(
        short,
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub open: Option<bool>,

    /// Output directory for static export.
    #[arg(short = 'd', long)]
    pub out_dir: Option<PathBuf>,

    /// Routing base path (e.g. `/docs`).
    #[arg(long)]
    pub basename: Option<String>,

    /// Disable the client script in exports.
    #[arg(
        long = "static",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub static_export: Option<bool>,

    /// Bundler config path (overrides `webpack.config.js` discovery).
    #[arg(long, value_name = "FILE")]
    pub webpack: Option<PathBuf>,

    /// Disable the centered page layout.
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub fullscreen: Option<bool>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// A bare invocation: no command and no path. Prints usage and exits 0
    /// without resolving any configuration.
    fn is_bare(&self) -> bool {
        self.command.is_none() && self.path.is_none()
    }

    /// The CLI flag layer: a key is defined only when the user passed the
    /// flag, so layer precedence distinguishes explicit values from
    /// defaults.
    fn flag_layer(&self) -> ConfigLayer {
        ConfigLayer {
            port: self.port,
            open: self.open,
            out_dir: self.out_dir.clone(),
            basename: self.basename.clone(),
            static_export: self.static_export,
            webpack: self.webpack.clone(),
            fullscreen: self.fullscreen,
        }
    }
}

// ---------------------------------------------------------------------------
// Positional interpretation
// ---------------------------------------------------------------------------

/// The closed set of dispatchable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Build,
    Dev,
}

/// Interpreted positional arguments: which operation to run and where the
/// docs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub operation: Operation,
    /// Input directory as given; `None` means the current directory.
    pub input: Option<PathBuf>,
}

/// Interpret `[command] [path]`.
///
/// A recognized command token (`build`, `dev`) is always a command, never a
/// path; anything else is the input directory for the default `dev`
/// operation. Callers must handle the both-absent case (usage help) before
/// getting here.
pub(crate) fn interpret(command: Option<&str>, path: Option<&Path>) -> Invocation {
    match command {
        Some("build") => Invocation {
            operation: Operation::Build,
            input: path.map(Path::to_path_buf),
        },
        Some("dev") => Invocation {
            operation: Operation::Dev,
            input: path.map(Path::to_path_buf),
        },
        Some(other) => Invocation {
            operation: Operation::Dev,
            input: Some(
                path.map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(other)),
            ),
        },
        None => Invocation {
            operation: Operation::Dev,
            input: path.map(Path::to_path_buf),
        },
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let directives = format!(
        "mdx_go={level},mdxgo_shared={level},mdxgo_build={level},mdxgo_dev={level}"
    );

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration resolution
// ---------------------------------------------------------------------------

/// Resolve the merged configuration for this invocation.
///
/// Pure given (cwd, flags, manifest, probed files); any failure here is a
/// fatal configuration error, surfaced before dispatch.
fn resolve_config(cli: &Cli, invocation: &Invocation, cwd: &Path) -> Result<ResolvedConfig> {
    let probe = RealFiles;

    let manifest = load_manifest(cwd, &probe)?;
    let layers = ConfigLayers::load(
        manifest.as_ref().and_then(|m| m.config_block.as_ref()),
        cli.flag_layer(),
    )?;

    let merged = layers.merged();
    let webpack = discover_bundler_config(merged.webpack.as_deref(), cwd, &probe)
        .map(|path| load_bundler_config(&path))
        .transpose()?;

    let derived = EnvironmentDerived {
        dirname: invocation.input.clone().unwrap_or_else(|| PathBuf::from(".")),
        webpack,
        css_library: detect_css_library(manifest.as_ref()),
    };

    Ok(resolve(&layers, derived, manifest, cwd))
}

// ---------------------------------------------------------------------------
// Command dispatch & outcome reporting
// ---------------------------------------------------------------------------

/// Run the CLI: resolve configuration, dispatch exactly one operation, and
/// report its outcome. Errors propagate to `main` for a non-zero exit.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    // No command and no path: usage help, exit 0, nothing resolved.
    if cli.is_bare() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let invocation = interpret(cli.command.as_deref(), cli.path.as_deref());
    let cwd = std::env::current_dir()?;
    let config = resolve_config(&cli, &invocation, &cwd)?;

    match invocation.operation {
        Operation::Build => cmd_build(&config).await,
        Operation::Dev => cmd_dev(&config).await,
    }
}

async fn cmd_build(config: &ResolvedConfig) -> Result<()> {
    info!(dirname = %config.dirname.display(), "building...");

    let spinner = progress_spinner("Exporting documents");
    let result = mdxgo_build::export(config).await;
    spinner.finish_and_clear();
    let result = result?;

    println!();
    println!("  Export complete!");
    println!("  Pages:  {}", result.page_count);
    println!("  Output: {}", result.out_dir.display());
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_dev(config: &ResolvedConfig) -> Result<()> {
    info!(dirname = %config.dirname.display(), "starting dev server...");

    let server = mdxgo_dev::serve(config).await?;
    let url = server.url();
    println!("  Listening on {url}");

    // Best-effort side effect: a failed browser open never changes the
    // outcome or the exit code.
    if config.open {
        if let Err(e) = webbrowser::open(&url) {
            warn!(url, error = %e, "failed to open browser");
        }
    }

    server.wait().await?;
    Ok(())
}

/// Spinner shown while an export runs.
fn progress_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("spinner template is valid")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_token_selects_build() {
        let inv = interpret(Some("build"), Some(Path::new("docs")));
        assert_eq!(inv.operation, Operation::Build);
        assert_eq!(inv.input, Some(PathBuf::from("docs")));
    }

    #[test]
    fn bare_build_uses_current_directory() {
        let inv = interpret(Some("build"), None);
        assert_eq!(inv.operation, Operation::Build);
        assert_eq!(inv.input, None);
    }

    #[test]
    fn bare_path_defaults_to_dev() {
        let inv = interpret(Some("docs"), None);
        assert_eq!(inv.operation, Operation::Dev);
        assert_eq!(inv.input, Some(PathBuf::from("docs")));
    }

    #[test]
    fn explicit_dev_token() {
        let inv = interpret(Some("dev"), Some(Path::new("docs")));
        assert_eq!(inv.operation, Operation::Dev);
        assert_eq!(inv.input, Some(PathBuf::from("docs")));
    }

    #[test]
    fn second_positional_wins_over_unrecognized_first() {
        let inv = interpret(Some("serve"), Some(Path::new("docs")));
        assert_eq!(inv.operation, Operation::Dev);
        assert_eq!(inv.input, Some(PathBuf::from("docs")));
    }

    #[test]
    fn flags_parse_into_the_cli_layer() {
        let cli = Cli::parse_from([
            "mdx-go", "build", "docs", "-p", "3000", "-d", "site", "--static", "--open", "false",
        ]);
        let layer = cli.flag_layer();

        assert_eq!(layer.port, Some(3000));
        assert_eq!(layer.out_dir, Some(PathBuf::from("site")));
        assert_eq!(layer.static_export, Some(true));
        assert_eq!(layer.open, Some(false));
        // Untouched flags stay undefined so lower layers can win.
        assert_eq!(layer.basename, None);
        assert_eq!(layer.fullscreen, None);
    }

    #[test]
    fn absent_flags_leave_the_layer_empty() {
        let cli = Cli::parse_from(["mdx-go", "docs"]);
        assert_eq!(cli.flag_layer(), ConfigLayer::default());
    }

    #[test]
    fn bare_invocation_short_circuits_to_help() {
        assert!(Cli::parse_from(["mdx-go"]).is_bare());
        // Flags alone do not select an operation either.
        assert!(Cli::parse_from(["mdx-go", "-p", "3000"]).is_bare());
        assert!(!Cli::parse_from(["mdx-go", "docs"]).is_bare());
        assert!(!Cli::parse_from(["mdx-go", "build"]).is_bare());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
