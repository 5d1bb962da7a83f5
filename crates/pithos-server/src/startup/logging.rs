//! Console and rolling-file logging.
//!
//! With file logging on, everything goes to `pithos.log`. Vote, delegation
//! and tally events are also copied to `democracy.log` so the history of a
//! decision can be read on its own.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const MAIN_LOG: &str = "pithos.log";
const DEMOCRACY_LOG: &str = "democracy.log";

/// Modules whose events are copied to [`DEMOCRACY_LOG`]
const DEMOCRACY_TARGETS: [&str; 2] = ["pithos_democracy", "pithos_bot::service"];

/// How often log files roll over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl FromStr for LogRotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(LogRotation::Daily),
            "hourly" => Ok(LogRotation::Hourly),
            "never" => Ok(LogRotation::Never),
            other => Err(format!("unknown log rotation `{}`", other)),
        }
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub console: bool,
    pub file: bool,
    pub level: Level,
    pub rotation: LogRotation,
}

fn home_log_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join("pithos")
        .join("logs")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: home_log_dir(),
            console: true,
            file: false,
            level: Level::INFO,
            rotation: LogRotation::default(),
        }
    }
}

impl LoggingConfig {
    /// Build from raw configuration values. Unparsable level or rotation
    /// strings fall back to the defaults.
    pub fn from_config(
        dir: Option<String>,
        console: bool,
        file: bool,
        level: &str,
        rotation: Option<&str>,
    ) -> Self {
        Self {
            dir: dir.map(PathBuf::from).unwrap_or_else(home_log_dir),
            console,
            file,
            level: level.parse().unwrap_or(Level::INFO),
            rotation: rotation.and_then(|r| r.parse().ok()).unwrap_or_default(),
        }
    }

    /// `RUST_LOG` when set, the configured level otherwise
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }

    fn appender(&self, file_name: &str) -> (NonBlocking, WorkerGuard) {
        tracing_appender::non_blocking(RollingFileAppender::new(
            self.rotation.into(),
            &self.dir,
            file_name,
        ))
    }
}

/// Flushes the file writers when dropped
pub struct LoggingGuard {
    _workers: Vec<WorkerGuard>,
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    fmt::layer()
        .with_target(true)
        .with_filter(config.env_filter())
        .boxed()
}

fn main_file_layer(config: &LoggingConfig, writer: NonBlocking) -> BoxedLayer {
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(config.env_filter())
        .boxed()
}

fn democracy_targets(level: Level) -> Targets {
    DEMOCRACY_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, LevelFilter::from_level(level))
        })
}

fn democracy_file_layer(config: &LoggingConfig, writer: NonBlocking) -> BoxedLayer {
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(democracy_targets(config.level))
        .boxed()
}

fn log_path(dir: &Path, file_name: &str) -> String {
    dir.join(file_name).display().to_string()
}

/// Install the global subscriber.
///
/// Fails if the log directory cannot be created or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut workers = Vec::new();

    if config.console {
        layers.push(console_layer(config));
    }
    if config.file {
        std::fs::create_dir_all(&config.dir)?;

        let (writer, worker) = config.appender(MAIN_LOG);
        layers.push(main_file_layer(config, writer));
        workers.push(worker);

        let (writer, worker) = config.appender(DEMOCRACY_LOG);
        layers.push(democracy_file_layer(config, writer));
        workers.push(worker);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if config.file {
        tracing::info!(
            main = %log_path(&config.dir, MAIN_LOG),
            democracy = %log_path(&config.dir, DEMOCRACY_LOG),
            rotation = ?config.rotation,
            "Writing log files"
        );
    }

    Ok(LoggingGuard { _workers: workers })
}
