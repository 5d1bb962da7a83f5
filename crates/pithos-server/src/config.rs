//! Configuration management for the Pithos server
//!
//! Values are layered, later sources winning: the YAML file
//! (`conf/application.yml` unless `--config` says otherwise), environment
//! variables prefixed `PITHOS` with `__` between key segments
//! (`PITHOS__DISCORD__TOKEN`), then command line flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment};
use pithos_bot::BotSettings;
use pithos_common::{DEFAULT_COMMAND_PREFIX, DEFAULT_MAX_DELEGATION_DEPTH, PithosError};

use crate::startup::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const ENV_PREFIX: &str = "PITHOS";

pub const DEFAULT_DB_URL: &str = "sqlite://pithos.db?mode=rwc";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

const DEFAULT_GENERATED: &str = "default_generated";
const DISCORD_CLIENT_ID: &str = "discord.client_id";
const DISCORD_TOKEN: &str = "discord.token";
const DISCORD_SERVER_ID: &str = "discord.server_id";
const DISCORD_COMMAND_PREFIX: &str = "discord.command_prefix";
const DISCORD_MOTION_CHANNEL_ID: &str = "discord.motion_channel_id";
const DISCORD_ARCHIVE_CHANNEL_ID: &str = "discord.archive_channel_id";
const DB_URL: &str = "db.url";
const DB_MAX_CONNECTIONS: &str = "db.max_connections";
const DEMOCRACY_MAX_DELEGATION_DEPTH: &str = "democracy.max_delegation_depth";
const DEMOCRACY_SWEEP_INTERVAL_SECS: &str = "democracy.sweep_interval_secs";
const LOGGING_DIR: &str = "logging.dir";
const LOGGING_CONSOLE: &str = "logging.console";
const LOGGING_FILE: &str = "logging.file";
const LOGGING_LEVEL: &str = "logging.level";
const LOGGING_ROTATION: &str = "logging.rotation";

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "pithos", version, about = "Liquid-democracy Discord bot")]
pub struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    #[arg(long = "db-url", env = "DATABASE_URL")]
    pub database_url: Option<String>,
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

/// Application configuration loaded from the config file, environment, and CLI
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load configuration using the process arguments
    pub fn new() -> anyhow::Result<Self> {
        Self::load(&Cli::parse())
    }

    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut builder = Config::builder()
            .add_source(config::File::from(cli.config.as_path()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = &cli.database_url {
            builder = builder.set_override(DB_URL, v.as_str())?;
        }
        if let Some(v) = &cli.log_level {
            builder = builder.set_override(LOGGING_LEVEL, v.as_str())?;
        }

        let config = builder.build().map_err(|e| {
            PithosError::ConfigError(format!(
                "failed to load {}: {}",
                cli.config.display(),
                e
            ))
        })?;
        Ok(Configuration { config })
    }

    /// Refuse configurations that cannot run the bot
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_generated() {
            return Err(PithosError::ConfigError(
                "the configuration still holds generated defaults; \
                 edit the configuration file and set `default_generated: false`"
                    .to_string(),
            )
            .into());
        }
        self.discord_token()?;
        self.server_id()?;
        self.motion_channel_id()?;
        self.archive_channel_id()?;
        Ok(())
    }

    fn required_id(&self, key: &str) -> anyhow::Result<u64> {
        let value = self
            .config
            .get_string(key)
            .map_err(|_| PithosError::ConfigError(format!("`{}` is missing", key)))?;
        match value.trim().parse::<u64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(PithosError::ConfigError(format!(
                "`{}` must be a Discord id, got `{}`",
                key, value
            ))
            .into()),
        }
    }

    pub fn default_generated(&self) -> bool {
        self.config.get_bool(DEFAULT_GENERATED).unwrap_or(false)
    }

    // ========================================================================
    // Discord Configuration
    // ========================================================================

    pub fn discord_token(&self) -> anyhow::Result<String> {
        match self.config.get_string(DISCORD_TOKEN) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(PithosError::ConfigError(format!("`{}` is missing", DISCORD_TOKEN)).into()),
        }
    }

    pub fn client_id(&self) -> Option<u64> {
        self.required_id(DISCORD_CLIENT_ID).ok()
    }

    pub fn server_id(&self) -> anyhow::Result<u64> {
        self.required_id(DISCORD_SERVER_ID)
    }

    pub fn motion_channel_id(&self) -> anyhow::Result<u64> {
        self.required_id(DISCORD_MOTION_CHANNEL_ID)
    }

    pub fn archive_channel_id(&self) -> anyhow::Result<u64> {
        self.required_id(DISCORD_ARCHIVE_CHANNEL_ID)
    }

    pub fn command_prefix(&self) -> String {
        self.config
            .get_string(DISCORD_COMMAND_PREFIX)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_COMMAND_PREFIX.to_string())
    }

    // ========================================================================
    // Database Configuration
    // ========================================================================

    pub fn db_url(&self) -> String {
        self.config
            .get_string(DB_URL)
            .unwrap_or(DEFAULT_DB_URL.to_string())
    }

    pub fn db_max_connections(&self) -> u32 {
        self.config
            .get_int(DB_MAX_CONNECTIONS)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    // ========================================================================
    // Democracy Configuration
    // ========================================================================

    pub fn max_delegation_depth(&self) -> usize {
        self.config
            .get_int(DEMOCRACY_MAX_DELEGATION_DEPTH)
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_DELEGATION_DEPTH)
    }

    pub fn sweep_interval(&self) -> Duration {
        let secs = self
            .config
            .get_int(DEMOCRACY_SWEEP_INTERVAL_SECS)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn bot_settings(&self) -> anyhow::Result<BotSettings> {
        Ok(BotSettings {
            command_prefix: self.command_prefix(),
            motion_channel_id: self.motion_channel_id()?,
            archive_channel_id: self.archive_channel_id()?,
            max_delegation_depth: self.max_delegation_depth(),
        })
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        let level = self
            .config
            .get_string(LOGGING_LEVEL)
            .unwrap_or("info".to_string());
        let rotation = self.config.get_string(LOGGING_ROTATION).ok();
        LoggingConfig::from_config(
            self.config.get_string(LOGGING_DIR).ok(),
            self.config.get_bool(LOGGING_CONSOLE).unwrap_or(true),
            self.config.get_bool(LOGGING_FILE).unwrap_or(false),
            &level,
            rotation.as_deref(),
        )
    }
}
