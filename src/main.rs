use anyhow::{Context, Result};
use cai2tf::config::Config;
use cai2tf::resource::{get_registry, ResourceConfig};
use cai2tf::services::Catalog;
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Convert Cloud Asset Inventory exports into Terraform configuration
#[derive(Parser, Debug)]
#[command(name = "cai2tf", version, about, long_about = None)]
struct Args {
    /// Asset export to convert (JSON array or newline-delimited JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra resource definitions merged over the built-in ones
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// Convert asset groups concurrently
    #[arg(long)]
    concurrent: bool,

    /// Remember --schemas, --output and --concurrent for later runs
    #[arg(long)]
    save_config: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cai2tf started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cai2tf").join("cai2tf.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cai2tf").join("cai2tf.log");
    }
    PathBuf::from("cai2tf.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let config = Config::load().with_overrides(
        args.schemas.as_deref(),
        args.concurrent,
        args.output.as_deref(),
    );
    if args.save_config {
        config.save().context("Failed to save config")?;
        tracing::info!("Saved config: {:?}", config);
    }

    let mut definitions = get_registry();
    if let Some(path) = &config.schema_file {
        tracing::info!("Loading extra definitions from {}", path.display());
        definitions.merge(ResourceConfig::from_file(path)?);
    }
    let catalog = Catalog::with_config(&definitions).context("Failed to build converters")?;

    let file = std::fs::File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let assets = cai2tf::load_assets(std::io::BufReader::new(file))?;
    tracing::info!("Loaded {} assets from {}", assets.len(), args.input.display());

    let document = if config.concurrent {
        catalog.convert_concurrent(&assets).await?
    } else {
        catalog.convert(&assets)?
    };

    match &config.output {
        Some(path) => std::fs::write(path, document)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout()
            .write_all(document.as_bytes())
            .context("Failed to write output")?,
    }

    Ok(())
}
