use crate::error::AppError;
use crate::services::threshold::PowerThreshold;
use crate::services::timezone::OperatingZone;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub usage: UsageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

fn default_api_host() -> String {
    "0.0.0.0".into()
}

fn default_api_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// IANA zone the plugs are deployed in. Day ranges are resolved here.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_power_threshold_w")]
    pub power_threshold_w: f64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            power_threshold_w: default_power_threshold_w(),
        }
    }
}

fn default_timezone() -> String {
    "America/Lima".into()
}

fn default_power_threshold_w() -> f64 {
    PowerThreshold::DEFAULT_WATTS
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, anyhow::Error> {
        let expanded = expand_env_placeholders(raw)?;
        let mut cfg: Self = serde_yaml::from_str(&expanded)?;

        // DATABASE_URL wins over whatever YAML had
        if let Ok(url) = std::env::var("DATABASE_URL") {
            match cfg.database {
                Some(ref mut db) => db.url = url,
                None => {
                    cfg.database = Some(DatabaseConfig {
                        url,
                        max_connections: default_max_connections(),
                    })
                }
            }
        }

        Ok(cfg)
    }

    pub fn operating_zone(&self) -> Result<OperatingZone, AppError> {
        OperatingZone::from_name(&self.usage.timezone)
    }

    pub fn power_threshold(&self) -> Result<PowerThreshold, AppError> {
        PowerThreshold::new(self.usage.power_threshold_w)
    }

    pub fn api_bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
fn expand_env_placeholders(input: &str) -> Result<String, anyhow::Error> {
    use anyhow::Context;

    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let close = match it.peek().copied() {
            Some('$') => {
                // "$$" -> "$"
                it.next();
                out.push('$');
                continue;
            }
            Some('(') => ')',
            Some('{') => '}',
            _ => {
                out.push('$');
                continue;
            }
        };
        it.next();
        let var = read_until(&mut it, close)
            .with_context(|| format!("unterminated env placeholder: missing '{}'", close))?;
        let val = std::env::var(&var)
            .with_context(|| format!("missing environment variable: {}", var))?;
        out.push_str(&val);
    }

    Ok(out)
}

fn read_until<I>(it: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut buf = String::new();
    for ch in it.by_ref() {
        if ch == end {
            return Some(buf);
        }
        buf.push(ch);
    }
    None
}
