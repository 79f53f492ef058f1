//! Start-up configuration, read once from environment variables.
//!
//! | variable | default |
//! |----------|---------|
//! | `FANZON_HOST` | `127.0.0.1` |
//! | `FANZON_PORT` | `8080` |
//! | `FANZON_DATABASE` | `fanzon.sqlite` |
//! | `FANZON_BATCH_SIZE` | `50` |
//! | `FANZON_MAX_ROWS` | `1000` |
//! | `FANZON_MAX_UPLOAD_BYTES` | `10485760` |
//! | `FANZON_SESSION_TTL_SECS` | `86400` |

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_MAX_ROWS: usize = 1000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Path of the SQLite file holding products and upload logs.
    pub database_path: String,
    /// Rows per batch sent to the product store.
    pub batch_size: usize,
    /// Maximum number of data rows accepted in one file.
    pub max_rows: usize,
    pub max_upload_bytes: usize,
    /// Upload sessions untouched for this long are dropped, unless submitting.
    pub session_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: "fanzon.sqlite".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_rows: DEFAULT_MAX_ROWS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl Config {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source, falling back
    /// to the defaults for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        Ok(Self {
            host: lookup("FANZON_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "FANZON_PORT", defaults.port)?,
            database_path: lookup("FANZON_DATABASE").unwrap_or(defaults.database_path),
            batch_size: parse_var(&lookup, "FANZON_BATCH_SIZE", defaults.batch_size)?.max(1),
            max_rows: parse_var(&lookup, "FANZON_MAX_ROWS", defaults.max_rows)?,
            max_upload_bytes: parse_var(
                &lookup,
                "FANZON_MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
            session_ttl_secs: parse_var(
                &lookup,
                "FANZON_SESSION_TTL_SECS",
                defaults.session_ttl_secs,
            )?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.max_rows, 1000);
        assert_eq!(config.session_ttl_secs, 86400);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("FANZON_PORT", "9000"),
            ("FANZON_BATCH_SIZE", "0"),
            ("FANZON_DATABASE", "/tmp/x.sqlite"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        // a zero batch size would never make progress
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.database_path, "/tmp/x.sqlite");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("FANZON_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("FANZON_PORT"));
    }
}
