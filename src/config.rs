use std::path::PathBuf;

use chrono_tz::Tz;

use crate::catalog::Catalog;
use crate::model::Resource;

/// Process configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// WAL file holding all booking events.
    pub db_path: PathBuf,
    /// Zone used to interpret and display local times at the HTTP boundary.
    pub tz: Tz,
    /// `None` means any origin.
    pub allow_origin: Option<String>,
    pub catalog: Catalog,
    pub compact_threshold: u64,
    pub static_dir: PathBuf,
    pub metrics_port: Option<u16>,
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { var: &'static str, value: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { var, value, reason } => {
                write!(f, "invalid {var}={value:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = get("POOLBOOK_BIND").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or("POOLBOOK_PORT", get("POOLBOOK_PORT"), 8000)?;
        let db_path = PathBuf::from(get("DB_PATH").unwrap_or_else(|| "data/bookings.wal".into()));

        let tz_name = get("TZ").unwrap_or_else(|| "Europe/Copenhagen".into());
        let tz = tz_name.parse::<Tz>().map_err(|e| ConfigError::Invalid {
            var: "TZ",
            value: tz_name.clone(),
            reason: e.to_string(),
        })?;

        let allow_origin = get("ALLOW_ORIGIN").filter(|o| o != "*" && !o.is_empty());

        let catalog = match get("POOLBOOK_RESOURCES") {
            None => Catalog::default(),
            Some(raw) => {
                let resources: Vec<Resource> =
                    serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
                        var: "POOLBOOK_RESOURCES",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
                Catalog::new(resources).map_err(|dup| ConfigError::Invalid {
                    var: "POOLBOOK_RESOURCES",
                    value: raw.clone(),
                    reason: format!("duplicate resource id {dup}"),
                })?
            }
        };

        let compact_threshold =
            parse_or("POOLBOOK_COMPACT_THRESHOLD", get("POOLBOOK_COMPACT_THRESHOLD"), 1000)?;
        let static_dir = PathBuf::from(get("POOLBOOK_STATIC_DIR").unwrap_or_else(|| "static".into()));
        let metrics_port = get("POOLBOOK_METRICS_PORT")
            .map(|v| parse_or("POOLBOOK_METRICS_PORT", Some(v), 0))
            .transpose()?;

        Ok(Self {
            bind,
            port,
            db_path,
            tz,
            allow_origin,
            catalog,
            compact_threshold,
            static_dir,
            metrics_port,
        })
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value: v,
        }),
    }
}
