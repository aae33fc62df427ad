//! Command-line interface for lineflux.
//!
//! Reads JSON records, one per line, and writes each as a newline-terminated
//! line protocol record on stdout. Points come from a [`PointPool`] so the
//! encoder runs allocation-free once the pool is warm.

pub mod record;

pub use record::JsonRecord;

use crate::core::config::ConfigBuilder;
use crate::core::{Config, LineError, Result};
use crate::pool::PointPool;
use crate::protocol::TimeUnit;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

/// Encode JSON metric records as InfluxDB line protocol
#[derive(Parser, Debug)]
#[command(name = "lineflux")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input file with one JSON record per line (default: stdin)
    #[arg(short, long, env = "LINEFLUX_INPUT")]
    pub input: Option<PathBuf>,

    /// Configuration file path (default: ~/.config/lineflux/config.yaml)
    #[arg(short, long, env = "LINEFLUX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Timestamp precision for records that do not name one
    #[arg(short, long, env = "LINEFLUX_PRECISION", default_value = "ns")]
    pub precision: TimeUnit,

    /// Number of points to pre-allocate
    #[arg(long, env = "LINEFLUX_POOL_SIZE")]
    pub pool_size: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, env = "LINEFLUX_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Config file
    /// 3. Defaults (lowest priority)
    pub fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = &self.config {
            // Explicitly requested: a missing file is an error
            builder = builder.from_file(path)?;
            tracing::info!("Loaded configuration from: {:?}", path);
        } else if let Some(path) = default_config_path().filter(|p| p.exists()) {
            builder = builder.from_file(&path)?;
            tracing::info!("Loaded configuration from: {:?}", path);
        } else {
            tracing::debug!("No config file found, using defaults");
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(size) = self.pool_size {
            builder = builder.pool_size(size);
        }

        builder.build()
    }

    /// Initialize logging. Logs go to stderr so stdout carries only records.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level =
            std::env::var("LINEFLUX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()
            .map_err(|e| LineError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lineflux").join("config.yaml"))
}

/// Execute the lineflux command.
pub fn execute(cli: Cli) -> Result<()> {
    cli.init_logging()?;

    let config = cli.load_config()?;

    if cli.check_config {
        config.validate()?;
        println!("Configuration is valid!");
        println!("  Pool size: {}", config.pool.size);
        println!("  Pool max size: {}", config.pool.max_size);
        println!("  Acquire timeout: {:?}", config.pool.acquire_timeout);
        println!("  Initial buffer size: {}", config.encoder.initial_buffer_size);
        return Ok(());
    }

    let pool = PointPool::new(&config.pool, &config.encoder)?;
    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());

    let count = match &cli.input {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                LineError::config(format!("Failed to open input {:?}: {}", path, e))
            })?;
            encode_stream(BufReader::new(file), &mut output, &pool, cli.precision)?
        },
        None => encode_stream(io::stdin().lock(), &mut output, &pool, cli.precision)?,
    };

    let stats = pool.stats();
    tracing::info!(
        "Encoded {} records ({} pooled points, hit rate {:.1}%)",
        count,
        stats.allocated,
        stats.hit_rate * 100.0
    );

    pool.shutdown();
    Ok(())
}

/// Encode every JSON record in `reader` into `writer`, one line each.
///
/// Blank lines are skipped. Stops at the first bad record; the error names
/// its line number. Returns the number of records written.
pub fn encode_stream<R, W>(
    reader: R,
    writer: &mut W,
    pool: &PointPool,
    precision: TimeUnit,
) -> Result<usize>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut count = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record = JsonRecord::parse(trimmed).map_err(|e| at_line(line_no, e))?;

        let mut point = pool.acquire()?;
        record
            .encode_into(&mut point, precision)
            .map_err(|e| at_line(line_no, e))?;
        point.write_to(&mut *writer).map_err(|e| at_line(line_no, e))?;
        point.release();

        writer.write_all(b"\n")?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

/// Attach a line number to record-level errors; pool and IO errors pass through.
fn at_line(line_no: usize, err: LineError) -> LineError {
    match err {
        LineError::Parse { message } => LineError::parse(format!("line {}: {}", line_no, message)),
        LineError::Serialization(e) => LineError::parse(format!("line {}: {}", line_no, e)),
        LineError::InvalidState(message) => {
            LineError::invalid_state(format!("line {}: {}", line_no, message))
        },
        other => other,
    }
}
