//! # Codemeta Harvester CLI (`codemeta-harvest`)
//!
//! Harvests software metadata from source repositories and writes one
//! `<identifier>.codemeta.json` record per project.
//!
//! ## Usage
//!
//! ```bash
//! codemeta-harvest [options] [targets...]
//! ```
//!
//! Each target is a project config file (`<identifier>.yml`) or a directory
//! of them. With no targets the current working directory is harvested in
//! place.
//!
//! ## Examples
//!
//! ```bash
//! # Harvest every project configured under ./projects/
//! codemeta-harvest --output-dir ./records ./projects
//!
//! # Re-harvest a single project, keeping staged intermediates for debugging
//! codemeta-harvest --regenerate --keep-intermediate projects/widgetlib.yml
//!
//! # Harvest the current checkout and print the record
//! codemeta-harvest --identifier widgetlib --stdout
//! ```

use clap::Parser;
use std::path::PathBuf;

use codemeta_harvester::checkout::git_available;
use codemeta_harvester::config::{collect_config_files, load_project_config};
use codemeta_harvester::error::HarvestError;
use codemeta_harvester::extract::ExtractorRegistry;
use codemeta_harvester::harvest::{run_harvest, run_harvest_cwd, HarvestOptions, HarvestOutcome};
use codemeta_harvester::logging::HarvestLog;

/// Harvest software metadata records from source repositories.
///
/// Projects are described by YAML config files; each names a source
/// repository and optional scan settings. Sources found in the checkout are
/// extracted and reconciled into one codemeta record per project.
#[derive(Parser)]
#[command(
    name = "codemeta-harvest",
    about = "Harvest software metadata records from source repositories",
    version
)]
struct Cli {
    /// Project config files (`<identifier>.yml`) or directories of them.
    ///
    /// With no targets the current working directory is harvested in place.
    targets: Vec<PathBuf>,

    /// Re-harvest even when the output record already exists.
    #[arg(long)]
    regenerate: bool,

    /// Ignore a `codemeta.json` found in the checkout and harvest from
    /// scratch instead of adopting it.
    #[arg(long)]
    ignore_existing: bool,

    /// Base URI for each record's `@id` (`<base-uri>/<identifier>`).
    #[arg(long)]
    base_uri: Option<String>,

    /// Extra field forced into every final record, as `key=value`.
    /// May be repeated.
    #[arg(long = "extra-option", value_parser = parse_key_val)]
    extra_options: Vec<(String, String)>,

    /// Force the project identifier (current-directory mode only; configured
    /// projects take their identifier from the config filename).
    #[arg(long)]
    identifier: Option<String>,

    /// Checkout cache directory. Clones persist here across runs.
    #[arg(long, default_value = "./.harvest-cache")]
    cache_dir: PathBuf,

    /// Directory receiving the final records and per-project harvest logs.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Verbose diagnostics on stderr.
    #[arg(long)]
    debug: bool,

    /// Keep staged per-extractor records under the cache for inspection.
    #[arg(long)]
    keep_intermediate: bool,

    /// Treat recoverable errors (failed extractor, malformed record, failed
    /// service) as project-fatal.
    #[arg(long)]
    strict: bool,

    /// Print the final record to stdout instead of writing the output file.
    #[arg(long)]
    stdout: bool,
}

/// Parse a `key=value` pair for `--extra-option` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if cli.debug { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !git_available() {
        return Err(HarvestError::MissingDependency("git".into()).into());
    }

    std::fs::create_dir_all(&cli.output_dir).map_err(|e| HarvestError::DirectorySetup {
        path: cli.output_dir.clone(),
        detail: e.to_string(),
    })?;

    let opts = HarvestOptions {
        cache_dir: cli.cache_dir.clone(),
        output_dir: cli.output_dir.clone(),
        regenerate: cli.regenerate,
        ignore_existing: cli.ignore_existing,
        base_uri: cli.base_uri.clone(),
        extra: cli.extra_options.clone(),
        keep_intermediate: cli.keep_intermediate,
        strict: cli.strict,
        stdout: cli.stdout,
    };
    let registry = ExtractorRegistry::with_builtins();

    if cli.targets.is_empty() {
        let cwd = std::env::current_dir()?;
        let mut log = HarvestLog::stderr_only();
        run_harvest_cwd(&cwd, cli.identifier.as_deref(), &opts, &registry, &mut log)?;
        return Ok(());
    }

    let configs = collect_config_files(&cli.targets)?;
    if configs.is_empty() {
        anyhow::bail!("no project config files found in the given targets");
    }

    let mut written = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for config_path in &configs {
        let config = match load_project_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("[ERROR] {e:#}");
                failed += 1;
                continue;
            }
        };

        let log_path = cli
            .output_dir
            .join(format!("{}.harvest.log", config.identifier));
        let mut log = match HarvestLog::to_file(&log_path) {
            Ok(log) => log,
            Err(_) => HarvestLog::stderr_only(),
        };

        println!("harvesting {}", config.identifier);
        match run_harvest(&config, &opts, &registry, &mut log) {
            Ok(HarvestOutcome::Written(path)) => {
                println!("  wrote {}", path.display());
                written += 1;
            }
            Ok(HarvestOutcome::Printed) => {
                written += 1;
            }
            Ok(HarvestOutcome::SkippedExisting(path)) => {
                println!("  up to date: {}", path.display());
                skipped += 1;
            }
            Err(err) if err.is_fatal() => {
                log.error(err.to_string());
                return Err(err.into());
            }
            Err(err) => {
                log.error(err.to_string());
                failed += 1;
            }
        }
    }

    println!("harvest complete: {written} written, {skipped} up to date, {failed} failed");
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
