use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tiny_squeeze::cli::{Args, Commands, RunOptions};
use tiny_squeeze::logger::Verbosity;
use tiny_squeeze::config::{parse_key_list, CliOverrides, ConfigFile, RunSettings};
use tiny_squeeze::progress::create_progress_spinner;
use tiny_squeeze::report::read_last_report_line;
use tiny_squeeze::{
    collect_asset_files, compress_tree, logger, Compressor, ContentCache, TinifyClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Commands::Compress {
            options,
            keys,
            min_percent,
        } => run_batch(options, keys, min_percent, false).await,
        Commands::Seed { options } => run_batch(options, None, None, true).await,
        Commands::Status {
            base_path,
            config,
            cache,
            report,
        } => show_status(base_path, config, cache, report).map(|_| ExitCode::SUCCESS),
    }
}

async fn run_batch(
    options: RunOptions,
    keys: Option<String>,
    min_percent: Option<f64>,
    bootstrap_mode: bool,
) -> anyhow::Result<ExitCode> {
    logger::set_verbosity(Verbosity::from_flags(options.quiet, options.verbose));

    let current_dir = std::env::current_dir().context("cannot determine current directory")?;
    let file_config = load_config_file(
        options.config.as_deref(),
        options.base_path.as_deref(),
        &current_dir,
    )?;
    let settings = RunSettings::resolve(
        CliOverrides {
            base_path: options.base_path,
            keys: keys.map(|k| parse_key_list(&k)),
            filters: options.filters,
            min_compress_percent: min_percent,
            cache_path: options.cache,
            report_path: options.report,
            bootstrap_mode,
        },
        file_config,
        &current_dir,
    );

    let mode = if settings.compressor.bootstrap_mode {
        "cache seeding"
    } else {
        "compression"
    };
    tiny_squeeze::info!("🚀 Starting {}...", mode);
    tiny_squeeze::info!("📁 Base path: {:?}", settings.base_path);
    tiny_squeeze::verbose!("Filters: {:?}", settings.filters);
    tiny_squeeze::verbose!("{} API keys configured", settings.compressor.credentials.len());

    let files = collect_asset_files(&settings.base_path, &settings.filters)
        .with_context(|| format!("failed to scan {:?}", settings.base_path))?;
    if files.is_empty() {
        tiny_squeeze::warn!("No matching image files found");
    }

    let service = TinifyClient::with_endpoint(settings.compressor.endpoint.clone())?;
    let mut compressor =
        Compressor::new(&settings.compressor, service)?.with_spinner(create_progress_spinner());

    let outcome = tokio::select! {
        result = compress_tree(&mut compressor, &settings.base_path, &files) => result.map(Some),
        _ = tokio::signal::ctrl_c() => Ok(None),
    };

    // Runs on every path out of the batch, interruption included
    compressor
        .finalize()
        .context("failed to write cache and report files")?;

    match outcome.context("batch aborted")? {
        None => bail!("interrupted, progress so far has been saved"),
        // The compressor already reported which key failed last
        Some(summary) if summary.halted => Ok(ExitCode::FAILURE),
        Some(summary) => {
            tiny_squeeze::info!(
                "✅ Done: {} files, {} rewritten, {} unchanged",
                summary.total,
                summary.rewritten,
                summary.unchanged
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn show_status(
    base_path: Option<PathBuf>,
    config: Option<PathBuf>,
    cache: Option<PathBuf>,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    let current_dir = std::env::current_dir().context("cannot determine current directory")?;
    let file_config = load_config_file(config.as_deref(), base_path.as_deref(), &current_dir)?;
    let settings = RunSettings::resolve(
        CliOverrides {
            base_path,
            cache_path: cache,
            report_path: report,
            ..CliOverrides::default()
        },
        file_config,
        &current_dir,
    );

    println!("📋 Status for {:?}", settings.base_path);
    if let Some(cache_path) = &settings.compressor.cache_path {
        let cache = ContentCache::load(cache_path);
        println!("  🗂️  Cached fingerprints: {} ({:?})", cache.len(), cache_path);
    }
    if let Some(report_path) = &settings.compressor.report_path {
        match read_last_report_line(report_path) {
            Some(line) => println!("  📊 Last run: {}", line),
            None => println!("  📊 No report at {:?}", report_path),
        }
    }

    Ok(())
}

fn load_config_file(
    explicit: Option<&Path>,
    base_path: Option<&Path>,
    current_dir: &Path,
) -> anyhow::Result<ConfigFile> {
    let config = match explicit {
        Some(path) => ConfigFile::load(path),
        None => ConfigFile::discover(base_path.unwrap_or(current_dir)),
    };
    config.context("failed to load config file")
}
