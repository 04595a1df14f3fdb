//! CLI binary for fileconv.
//!
//! A thin shim over the library crate: maps flags to `ClientConfig`, drives
//! one `Workflow` through select → discover → convert, and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use fileconv::{
    load_file, ApiClient, ClientConfig, ConversionOutcome, DeliveredArtifact, DirectoryDownloader,
    DiscoveryOutcome, FormatCatalog, Locale, Service, Stage, Workflow, WorkflowObserver,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner whose prefix follows the workflow stage,
/// plus one log line per finished step printed above it.
struct CliObserver {
    bar: ProgressBar,
    started: Instant,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Instant::now(),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl WorkflowObserver for CliObserver {
    fn on_stage_change(&self, _from: Stage, to: Stage) {
        let prefix = match to {
            Stage::Empty => "Idle",
            Stage::Selected => "Discovering",
            Stage::Ready => "Ready",
            Stage::SelectionError | Stage::ConversionError => "Failed",
            Stage::Converting => "Converting",
        };
        self.bar.set_prefix(prefix);
    }

    fn on_discovery_start(&self, file_name: &str, extension: &str) {
        self.bar
            .set_message(format!("{file_name}  {}", dim(&format!("(.{extension})"))));
    }

    fn on_formats_loaded(&self, catalog: &FormatCatalog) {
        self.bar.println(format!(
            "  {} {} → {}",
            green("✓"),
            bold(&catalog.input_format),
            catalog.output_formats.join(", ")
        ));
    }

    fn on_conversion_start(&self, file_name: &str, format: &str) {
        self.bar
            .set_message(format!("{file_name} → {}", bold(format)));
    }

    fn on_delivered(&self, artifact: &DeliveredArtifact) {
        self.bar.println(format!(
            "  {} Saved {}  {}",
            green("✓"),
            bold(&artifact.name),
            dim(&format!(
                "{} bytes, {:.1}s",
                artifact.bytes,
                self.started.elapsed().as_secs_f64()
            )),
        ));
    }

    fn on_error(&self, message: &str) {
        self.bar.println(format!("  {} {}", red("✗"), red(message)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Which formats can this file become?
  fileconv --api-base http://localhost:8080 photo.jpg

  # Convert to WebP into the current directory
  fileconv --api-base http://localhost:8080 photo.jpg --to webp

  # Convert into ./out, replacing an existing file
  fileconv photo.png --to jpg -o out --overwrite

  # Machine-readable workflow state
  fileconv --json photo.jpg --to png

  # Backend overview
  fileconv --supported-formats --health --stats

BACKEND ROUTES (relative to --api-base):
  GET  /api/format/available-formats/{ext}   output formats for one extension
  GET  /api/format/supported-formats         all accepted input formats
  POST /api/image/convert                    multipart: file, format
  GET  /api/stats/metrics                    conversion counters
  GET  /api/{format,image,stats}/health      service liveness

ENVIRONMENT VARIABLES:
  FILECONV_API_BASE       Backend base URL (required; no same-origin default natively)
  FILECONV_LOCALE         Message language: en (default), ru
  RUST_LOG                Override log filter (e.g. fileconv=debug)
"#;

/// Convert files through a format-conversion backend.
#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert files through a format-conversion backend",
    long_about = "Select a file, discover which formats the backend can turn it into, \
convert it and save the result. Without --to, only the available target formats are listed.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File to convert.
    input: Option<PathBuf>,

    /// Target format; must be one the backend offers for this file.
    #[arg(short, long, env = "FILECONV_TO")]
    to: Option<String>,

    /// Directory the converted file is saved into.
    #[arg(short, long, env = "FILECONV_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Replace an existing file instead of saving as `name (1).ext`.
    #[arg(long, env = "FILECONV_OVERWRITE")]
    overwrite: bool,

    /// Backend base URL, e.g. http://localhost:8080.
    #[arg(long, env = "FILECONV_API_BASE")]
    api_base: Option<String>,

    /// Language of workflow messages.
    #[arg(long, env = "FILECONV_LOCALE", value_enum, default_value = "en")]
    locale: LocaleArg,

    /// Format discovery timeout in seconds.
    #[arg(long, env = "FILECONV_DISCOVERY_TIMEOUT", default_value_t = 30)]
    discovery_timeout: u64,

    /// Conversion (upload + download) timeout in seconds.
    #[arg(long, env = "FILECONV_CONVERSION_TIMEOUT", default_value_t = 300)]
    conversion_timeout: u64,

    /// List every input format the backend accepts.
    #[arg(long)]
    supported_formats: bool,

    /// Check the health endpoint of each backend service.
    #[arg(long)]
    health: bool,

    /// Print conversion statistics.
    #[arg(long)]
    stats: bool,

    /// Output JSON instead of human-readable text.
    #[arg(long, env = "FILECONV_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "FILECONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILECONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "FILECONV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LocaleArg {
    En,
    Ru,
}

impl From<LocaleArg> for Locale {
    fn from(v: LocaleArg) -> Self {
        match v {
            LocaleArg::En => Locale::En,
            LocaleArg::Ru => Locale::Ru,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.input.is_some();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.input.is_none() && !cli.supported_formats && !cli.health && !cli.stats {
        bail!("Nothing to do: pass an INPUT file, or --supported-formats / --health / --stats");
    }
    if cli.to.is_some() && cli.input.is_none() {
        bail!("--to needs an INPUT file");
    }

    let config = build_config(&cli)?;
    let client = ApiClient::new(config).context("Failed to create HTTP client")?;

    // ── Backend overview ─────────────────────────────────────────────────
    if cli.health {
        print_health(&client, cli.json).await?;
    }
    if cli.supported_formats {
        let formats = client
            .supported_formats()
            .await
            .context("Failed to fetch supported formats")?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&formats)?);
        } else {
            println!("{}", formats.supported_input_formats.join("\n"));
        }
    }
    if cli.stats {
        let stats = client
            .conversion_stats()
            .await
            .context("Failed to fetch conversion statistics")?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Conversions:  {}", stats.total_conversions);
            println!("Errors:       {}", stats.errors);
            for (format, n) in &stats.by_format {
                println!("  {:<10} {}", format, n);
            }
            if let Some(ts) = stats.last_event_ts {
                println!("Last event:   {}", ts);
            }
        }
    }

    let Some(ref input) = cli.input else {
        return Ok(());
    };

    // ── Workflow ─────────────────────────────────────────────────────────
    let file = load_file(input)
        .await
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let downloader = DirectoryDownloader::new(&cli.output_dir).overwrite(cli.overwrite);
    let mut workflow = Workflow::from_client(client, Arc::new(downloader));
    let observer = show_progress.then(CliObserver::new);
    if let Some(ref obs) = observer {
        workflow = workflow.with_observer(obs.clone());
    }

    let discovery = workflow.select_file(file).await;
    let result = run(&cli, &workflow, discovery).await;
    if let Some(obs) = observer {
        obs.finish();
    }
    result
}

/// Drive the workflow past discovery and print the outcome.
async fn run(cli: &Cli, workflow: &Workflow, discovery: DiscoveryOutcome) -> Result<()> {
    let catalog = match discovery {
        DiscoveryOutcome::Loaded(catalog) => catalog,
        DiscoveryOutcome::Failed(message) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&workflow.snapshot())?);
            }
            bail!("{message}");
        }
        DiscoveryOutcome::NoFile | DiscoveryOutcome::Stale => {
            bail!("Selection changed while formats were being discovered")
        }
    };

    let Some(ref format) = cli.to else {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&workflow.snapshot())?);
        } else {
            print_catalog(workflow, &catalog);
        }
        return Ok(());
    };

    if !workflow.can_convert(format) {
        bail!(
            "'{}' is not offered for .{} files (available: {})",
            format,
            catalog.input_format,
            catalog.output_formats.join(", ")
        );
    }

    let outcome = workflow
        .convert_file(format)
        .await
        .context("Failed to save converted file")?;

    match outcome {
        ConversionOutcome::Delivered(artifact) => {
            if cli.json {
                let out = serde_json::json!({
                    "workflow": workflow.snapshot(),
                    "artifact": artifact,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if !cli.quiet {
                let location = artifact
                    .location
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| artifact.name.clone());
                eprintln!(
                    "{}  {}  {}  →  {}",
                    green("✔"),
                    workflow
                        .selected_file()
                        .map(|f| f.name().to_string())
                        .unwrap_or_default(),
                    dim(&format!("{} bytes", artifact.bytes)),
                    bold(&location),
                );
            }
            Ok(())
        }
        ConversionOutcome::Failed(message) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&workflow.snapshot())?);
            }
            bail!("{message}")
        }
        ConversionOutcome::Skipped(reason) => bail!("Conversion skipped: {reason:?}"),
        ConversionOutcome::Stale => bail!("Selection changed while the file was converting"),
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let base = cli.api_base.as_deref().unwrap_or_default().trim();
    if base.is_empty() {
        bail!("No backend URL: pass --api-base or set FILECONV_API_BASE");
    }

    ClientConfig::builder()
        .base_url(base)
        .locale(cli.locale.into())
        .discovery_timeout_secs(cli.discovery_timeout)
        .conversion_timeout_secs(cli.conversion_timeout)
        .build()
        .context("Invalid configuration")
}

fn print_catalog(workflow: &Workflow, catalog: &FormatCatalog) {
    if let Some(file) = workflow.selected_file() {
        println!(
            "{}  {}",
            bold(file.name()),
            dim(&format!("({}, {} bytes)", catalog.input_format, file.len()))
        );
    }
    if !catalog.available_converters.is_empty() {
        println!("Converters:   {}", catalog.available_converters.join(", "));
    }
    println!("Targets:      {}", cyan(&workflow.available_targets().join(", ")));
}

async fn print_health(client: &ApiClient, json: bool) -> Result<()> {
    let checks = futures::future::join_all(Service::ALL.iter().map(|&s| async move {
        (s, client.health(s).await)
    }))
    .await;

    if json {
        let map: serde_json::Map<String, serde_json::Value> = checks
            .iter()
            .map(|(s, r)| {
                let v = match r {
                    Ok(h) => serde_json::Value::String(h.status.clone()),
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                };
                (s.to_string(), v)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for (service, result) in &checks {
        match result {
            Ok(h) if h.is_ok() => println!("{} {:<8} {}", green("✓"), service, h.status),
            Ok(h) => println!("{} {:<8} {}", cyan("⚠"), service, h.status),
            Err(e) => println!("{} {:<8} {}", red("✗"), service, red(&e.to_string())),
        }
    }
    Ok(())
}
