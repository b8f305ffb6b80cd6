use crate::cli::Cli;
use crate::error::{AppError, Result};
use crate::format::PowerUnit;
use crate::snapshot::BuildOptions;
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const MAX_LOADPOINTS_LIMIT: usize = 4;
const DEFAULT_MAX_LOADPOINTS: usize = 4;
const DEFAULT_SERVE_HOST: &str = "0.0.0.0";
const DEFAULT_SERVE_PORT: u16 = 8080;

/// Resolved configuration, read-only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub evcc_url: String,
    pub webhook: Option<String>,
    pub timezone: Option<String>,
    /// Seconds between cycles; 0 runs a single cycle.
    pub interval: u64,
    pub max_loadpoints: usize,
    pub power_unit: PowerUnit,
    pub serve: ServeConfig,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

/// YAML config file layout. All keys are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub evcc_url: Option<String>,
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub max_loadpoints: Option<usize>,
    #[serde(default)]
    pub power_unit: Option<PowerUnit>,
    #[serde(default)]
    pub serve: FileServeConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileServeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl FileConfig {
    /// Load a YAML file, substituting `$(VAR)` and `${VAR}` from the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        // An empty file parses as null; treat it as "no keys".
        let config: Option<FileConfig> = serde_yaml::from_str(&expanded)?;
        Ok(config.unwrap_or_default())
    }
}

impl Config {
    /// Resolve from the command line, the config file it names, and the
    /// environment. Fails fast on anything that would make the loop useless.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path).map_err(|e| {
                AppError::Config(format!(
                    "failed to load config file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Command line > file > `TZ` environment variable > defaults.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let evcc_url = cli
            .url
            .clone()
            .or(file.evcc_url)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "evcc URL is required (--url, EVCC_URL or 'evcc_url' in the config file)"
                        .to_string(),
                )
            })?;

        let timezone = cli
            .timezone
            .clone()
            .or(file.timezone)
            .or_else(|| std::env::var("TZ").ok())
            .filter(|tz| !tz.trim().is_empty());

        let config = Config {
            evcc_url,
            webhook: cli
                .webhook
                .clone()
                .or(file.webhook)
                .filter(|w| !w.trim().is_empty()),
            timezone,
            interval: cli.interval.or(file.interval).unwrap_or(0),
            max_loadpoints: cli
                .max_loadpoints
                .or(file.max_loadpoints)
                .unwrap_or(DEFAULT_MAX_LOADPOINTS),
            power_unit: cli.power_unit.or(file.power_unit).unwrap_or_default(),
            serve: ServeConfig {
                enabled: cli.serve || file.serve.enabled,
                host: cli
                    .host
                    .clone()
                    .or(file.serve.host)
                    .unwrap_or_else(|| DEFAULT_SERVE_HOST.to_string()),
                port: cli.port.or(file.serve.port).unwrap_or(DEFAULT_SERVE_PORT),
            },
            dry_run: cli.dry_run,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validate_http_url("evcc URL", &self.evcc_url)?;

        if let Some(webhook) = &self.webhook {
            validate_http_url("webhook URL", webhook)?;
        }

        if !(1..=MAX_LOADPOINTS_LIMIT).contains(&self.max_loadpoints) {
            return Err(AppError::Config(format!(
                "max_loadpoints must be between 1 and {}, got {}",
                MAX_LOADPOINTS_LIMIT, self.max_loadpoints
            )));
        }

        self.tz()?;

        if self.serve.enabled && self.serve.port == 0 {
            return Err(AppError::Config("Server port cannot be 0".to_string()));
        }

        if self.webhook.is_none() && !self.serve.enabled && !self.dry_run {
            return Err(AppError::Config(
                "nothing to deliver to: configure a webhook, enable serve mode, or use --dry-run"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed timezone; `None` means UTC.
    pub fn tz(&self) -> Result<Option<Tz>> {
        match &self.timezone {
            None => Ok(None),
            Some(name) => name
                .parse::<Tz>()
                .map(Some)
                .map_err(|_| AppError::Config(format!("unknown timezone '{}'", name))),
        }
    }

    pub fn build_options(&self) -> Result<BuildOptions> {
        Ok(BuildOptions {
            max_loadpoints: self.max_loadpoints,
            power_unit: self.power_unit,
            timezone: self.tz()?,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn serve_addr(&self) -> String {
        format!("{}:{}", self.serve.host, self.serve.port)
    }
}

fn validate_http_url(what: &str, value: &str) -> Result<()> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| AppError::Config(format!("invalid {} '{}': {}", what, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::Config(format!(
            "{} must use http or https, got '{}'",
            what, scheme
        ))),
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$(?:\(([A-Z_][A-Z0-9_]*)\)|\{([A-Z_][A-Z0-9_]*)\})")
            .expect("placeholder pattern is valid")
    })
}

/// Expand `$(VAR_NAME)` and `${VAR_NAME}`. Unknown variables are left as-is.
fn expand_env_vars(content: &str) -> String {
    placeholder_regex()
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
