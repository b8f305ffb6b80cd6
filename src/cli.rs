use crate::format::PowerUnit;
use clap::Parser;
use std::path::PathBuf;

/// Command line. Every value is optional so the YAML file can fill the gaps;
/// explicit flags win over the file.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "evcc-collector",
    version,
    about = "Collect data from evcc and send it to a TRMNL webhook or serve it over HTTP",
    after_help = "Examples:\n  \
        evcc-collector --config config.yaml\n  \
        evcc-collector -u http://evcc:7070 -w https://usetrmnl.com/api/custom_plugins/<uuid>\n  \
        evcc-collector -u http://evcc:7070 --dry-run\n  \
        evcc-collector --config config.yaml --serve --port 8080"
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short = 'C', long, env = "APP_CONFIG")]
    pub config: Option<PathBuf>,

    /// evcc URL (e.g. http://evcc:7070)
    #[arg(short = 'u', long, env = "EVCC_URL")]
    pub url: Option<String>,

    /// Webhook URL receiving the snapshot
    #[arg(short = 'w', long, env = "WEBHOOK_URL")]
    pub webhook: Option<String>,

    /// IANA timezone for local timestamps (default: TZ env, then UTC)
    #[arg(short = 'z', long)]
    pub timezone: Option<String>,

    /// Collection interval in seconds (0 = run once)
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,

    /// Max loadpoints to include, 1-4 (default: 4)
    #[arg(long)]
    pub max_loadpoints: Option<usize>,

    /// Power display unit (default: auto)
    #[arg(long, value_enum)]
    pub power_unit: Option<PowerUnit>,

    /// Enable the HTTP server
    #[arg(long)]
    pub serve: bool,

    /// HTTP server port (default: 8080)
    #[arg(long)]
    pub port: Option<u16>,

    /// HTTP bind address (default: 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print JSON instead of sending it to the webhook
    #[arg(long)]
    pub dry_run: bool,
}
