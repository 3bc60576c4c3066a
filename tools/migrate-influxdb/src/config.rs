//! Command-line arguments and the immutable run configuration

use clap::Parser;
use migration_common::{CountPolicy, MigrationError, MigrationResult, PipelineOptions};
use reqwest::Url;
use secrecy::SecretString;
use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_SOURCE_URL: &str = "https://influxdb.hq.grdl.pl";

#[derive(Parser, Debug)]
#[command(name = "migrate-influxdb")]
#[command(
    about = "Migrate wide nest tables into per-metric Prometheus points",
    long_about = None
)]
pub struct Args {
    /// Number of rows converted and inserted at a time
    #[arg(long, env = "MIGRATE_BATCH_SIZE", default_value = "10000")]
    pub batch_size: usize,

    /// Username for the source InfluxDB
    #[arg(long, env = "SOURCE_USERNAME")]
    pub source_username: String,

    /// Password for the source InfluxDB
    #[arg(long, env = "SOURCE_PASSWORD", hide_env_values = true)]
    pub source_password: String,

    /// Username for the target InfluxDB. If missing, source-username is used
    #[arg(long, env = "TARGET_USERNAME")]
    pub target_username: Option<String>,

    /// Password for the target InfluxDB. If missing, source-password is used
    #[arg(long, env = "TARGET_PASSWORD", hide_env_values = true)]
    pub target_password: Option<String>,

    /// URL of the source InfluxDB
    #[arg(long, env = "SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// URL of the target InfluxDB. If missing, source-url is used
    #[arg(long, env = "TARGET_URL")]
    pub target_url: Option<String>,

    /// Name of the source database
    #[arg(long, env = "SOURCE_DB", default_value = "nestats")]
    pub source_db: String,

    /// Name of the target database
    #[arg(long, env = "TARGET_DB", default_value = "prometheus")]
    pub target_db: String,

    /// Query and convert every batch without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Abort when the count query disagrees with the rows received
    #[arg(long)]
    pub strict_counts: bool,

    /// HTTP request timeout in seconds (transport default when unset)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Address and credentials of one InfluxDB instance
#[derive(Debug)]
pub struct StoreConfig {
    pub url: Url,
    pub username: String,
    pub password: SecretString,
}

impl StoreConfig {
    fn parse(role: &str, url: &str, username: String, password: String) -> MigrationResult<Self> {
        let url = Url::parse(url).map_err(|e| {
            MigrationError::ConnectionError(format!("invalid {role} URL '{url}': {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MigrationError::ConnectionError(format!(
                "{role} URL '{url}' must use http or https"
            )));
        }

        Ok(Self {
            url,
            username,
            password: SecretString::new(password.into()),
        })
    }
}

/// Everything a run needs, resolved once at startup
#[derive(Debug)]
pub struct MigrationConfig {
    pub source: StoreConfig,
    pub target: StoreConfig,
    pub source_db: String,
    pub target_db: String,
    pub batch_size: NonZeroUsize,
    pub count_policy: CountPolicy,
    pub dry_run: bool,
    pub timeout: Option<Duration>,
}

impl MigrationConfig {
    /// Resolve target defaults and validate URLs and batch size
    pub fn from_args(args: Args) -> MigrationResult<Self> {
        let batch_size = NonZeroUsize::new(args.batch_size).ok_or_else(|| {
            MigrationError::ValidationError("batch size must be at least 1".to_string())
        })?;

        let target_url = args.target_url.unwrap_or_else(|| args.source_url.clone());
        let target_username = args
            .target_username
            .unwrap_or_else(|| args.source_username.clone());
        let target_password = args
            .target_password
            .unwrap_or_else(|| args.source_password.clone());

        let source = StoreConfig::parse(
            "source",
            &args.source_url,
            args.source_username,
            args.source_password,
        )?;
        let target = StoreConfig::parse("target", &target_url, target_username, target_password)?;

        Ok(Self {
            source,
            target,
            source_db: args.source_db,
            target_db: args.target_db,
            batch_size,
            count_policy: if args.strict_counts {
                CountPolicy::Strict
            } else {
                CountPolicy::Advisory
            },
            dry_run: args.dry_run,
            timeout: args.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Pipeline settings derived from this configuration
    #[must_use]
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            source_database: self.source_db.clone(),
            target_database: self.target_db.clone(),
            batch_size: self.batch_size,
            count_policy: self.count_policy,
            dry_run: self.dry_run,
        }
    }
}
