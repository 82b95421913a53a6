//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use vitrine_cms::WordPressClient;
use vitrine_shared::{AppConfig, CmsSettings, init_config, load_config};
use vitrine_site::{
    BuildResult, FeedKind, ProgressReporter, SiteContext, build_all, compose_feed, load_catalog,
};
use vitrine_storage::Storage;

use crate::server::{self, AppState};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Vitrine — content backend for the agency marketing site.
#[derive(Parser)]
#[command(
    name = "vitrine",
    version,
    about = "Serve page data, sitemaps and exports built from the WordPress CMS.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start the HTTP server (feeds, page data, uploads, GraphQL proxy).
    Serve {
        /// Socket address to listen on (overrides `server.bind`).
        #[arg(long, env = "VITRINE_BIND")]
        bind: Option<String>,
    },

    /// Render every feed into a directory for static hosting.
    Build {
        /// Output directory.
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,
    },

    /// Print a single feed to stdout.
    Feed {
        /// Feed name: index, static, blog, expertise, levee, toolbox, team,
        /// portfolio, news, discover, campaigns or keywords.
        name: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "vitrine=info",
        1 => "vitrine=debug",
        _ => "vitrine=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { bind } => cmd_serve(bind.as_deref()).await,
        Command::Build { out } => cmd_build(&out).await,
        Command::Feed { name } => cmd_feed(&name).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Resolve the CMS client and rendering context from config.
fn site_setup(config: &AppConfig) -> Result<(WordPressClient, SiteContext)> {
    let settings = CmsSettings::from_config(&config.cms)?;
    let client = WordPressClient::new(settings)?;
    let catalog = load_catalog(config.catalog.path.as_deref().map(Path::new))?;
    let ctx = SiteContext::from_config(config, catalog)?;
    Ok((client, ctx))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(bind: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let (client, ctx) = site_setup(&config)?;

    let bind = bind.unwrap_or(&config.server.bind).to_string();
    let storage = Storage::open(Path::new(&config.server.database_path)).await?;

    let upload_dir = PathBuf::from(&config.server.upload_dir);
    std::fs::create_dir_all(&upload_dir)
        .map_err(|e| eyre!("cannot create upload directory {}: {e}", upload_dir.display()))?;

    let client = Arc::new(client);
    let state = AppState {
        ctx: Arc::new(ctx),
        source: client.clone(),
        proxy: client,
        storage: Arc::new(storage),
        upload_dir,
    };

    info!(
        bind = %bind,
        cms = %config.cms.base_url,
        "starting server"
    );
    server::serve(state, &bind, config.server.max_upload_bytes).await
}

async fn cmd_build(out: &Path) -> Result<()> {
    let config = load_config()?;
    let (client, ctx) = site_setup(&config)?;

    info!(out = %out.display(), "building feeds");
    let reporter = CliProgress::new()?;
    let result = build_all(&client, &ctx, out, Utc::now(), &reporter).await?;

    println!();
    println!("  Feeds built successfully!");
    println!("  Files:  {}", result.files.len());
    println!("  Path:   {}", result.out_dir.display());
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();
    for file in &result.files {
        println!("  {:<26} {:>8} B  {}", file.file_name, file.size_bytes, &file.sha256[..12]);
    }

    Ok(())
}

async fn cmd_feed(name: &str) -> Result<()> {
    let kind = FeedKind::from_name(name)?;
    let config = load_config()?;
    let (client, ctx) = site_setup(&config)?;

    let body = compose_feed(kind, &client, &ctx, Utc::now()).await?;
    print!("{body}");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn feed_written(&self, file_name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing [{current}/{total}] {file_name}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
