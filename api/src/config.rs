//! Command line and environment configuration.
//!
//! Every option can come from a flag or from the environment; a `.env` file
//! in the working directory is loaded before parsing.

use crate::rate_limit::RateLimitConfig;
use catalog_filter::PaginationConfig;
use catalog_sync::{ContentfulConfig, QueueConfig, SyncConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "catalog-api")]
#[command(about = "Product catalog API and Contentful importer")]
pub struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,

    // `serve` options when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API with the scheduled importer (default)
    Serve(ServeArgs),
    /// Run one sync and wait for its import jobs
    Sync(SyncArgs),
    /// Sign a new API key
    GenerateApiKey(GenerateKeyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// HTTP port
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Secret used to verify API keys
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Default page size for product lists
    #[arg(long, env = "LIST_DEFAULT_LIMIT", default_value = "5")]
    pub list_default_limit: u64,

    /// Largest page size a client may request
    #[arg(long, env = "LIST_MAX_LIMIT", default_value = "5")]
    pub list_max_limit: u64,

    /// Seconds between scheduled syncs
    #[arg(long, env = "SYNC_INTERVAL_SECS", default_value = "3600")]
    pub sync_interval_secs: u64,

    /// Requests each client may make per window; 0 disables throttling
    #[arg(long, env = "RATE_LIMIT_REQUESTS", default_value = "10")]
    pub rate_limit_requests: u32,

    /// Length of the throttling window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value = "10")]
    pub rate_limit_window_secs: u64,

    #[command(flatten)]
    pub import: ImportArgs,
}

impl ServeArgs {
    pub fn pagination(&self) -> PaginationConfig {
        PaginationConfig {
            default_limit: self.list_default_limit,
            max_limit: self.list_max_limit,
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    pub fn rate_limit(&self) -> Option<RateLimitConfig> {
        if self.rate_limit_requests == 0 {
            return None;
        }
        Some(RateLimitConfig {
            max_requests: self.rate_limit_requests,
            window: Duration::from_secs(self.rate_limit_window_secs.max(1)),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Ignore the stored cursor and run a full initial sync
    #[arg(long)]
    pub initial: bool,

    #[command(flatten)]
    pub import: ImportArgs,
}

/// Storage, Contentful and worker settings shared by `serve` and `sync`.
#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "catalog.db")]
    pub database_path: PathBuf,

    #[arg(long, env = "CONTENTFUL_BASE_URL", default_value = "https://cdn.contentful.com")]
    pub contentful_base_url: String,

    #[arg(long, env = "CONTENTFUL_SPACE_ID")]
    pub contentful_space_id: Option<String>,

    #[arg(long, env = "CONTENTFUL_ACCESS_TOKEN", hide_env_values = true)]
    pub contentful_access_token: Option<String>,

    #[arg(long, env = "CONTENTFUL_ENVIRONMENT", default_value = "master")]
    pub contentful_environment: String,

    #[arg(long, env = "CONTENTFUL_CONTENT_TYPE", default_value = "product")]
    pub contentful_content_type: String,

    #[arg(long, env = "CONTENTFUL_LOCALE", default_value = "en-US")]
    pub contentful_locale: String,

    /// Concurrent import workers
    #[arg(long, env = "IMPORT_WORKERS", default_value = "4")]
    pub import_workers: usize,
}

impl ImportArgs {
    /// Contentful settings, or `None` when the space or token is missing.
    pub fn contentful(&self) -> Option<ContentfulConfig> {
        let space_id = self.contentful_space_id.clone().filter(|s| !s.is_empty())?;
        let access_token = self.contentful_access_token.clone().filter(|s| !s.is_empty())?;
        Some(ContentfulConfig {
            base_url: self.contentful_base_url.clone(),
            space_id,
            environment: self.contentful_environment.clone(),
            access_token,
            content_type: self.contentful_content_type.clone(),
            locale: self.contentful_locale.clone(),
            ..Default::default()
        })
    }

    pub fn queue(&self) -> QueueConfig {
        QueueConfig {
            workers: self.import_workers.max(1),
            ..Default::default()
        }
    }

    pub fn sync(&self) -> SyncConfig {
        SyncConfig::default()
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateKeyArgs {
    /// File the secret and key are written to
    #[arg(short, long, default_value = "generated-api-key.txt")]
    pub output: PathBuf,

    /// Secret to sign with; a new one is generated when unset
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Key lifetime (`3600`, `30d`, `1y`, ...)
    #[arg(long, env = "JWT_EXPIRES_IN", default_value = "1y")]
    pub expires_in: String,
}
