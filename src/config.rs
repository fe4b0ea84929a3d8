use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Data file, or a directory that holds it.
    pub data_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_path: PathBuf::from(crate::storage::DEFAULT_FILENAME),
        }
    }
}

impl AppConfig {
    /// Load from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let host = lookup("TALLY_HOST").unwrap_or(defaults.host);

        let port = match lookup("TALLY_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .context("TALLY_PORT must be a valid u16")?,
            None => defaults.port,
        };

        let data_path = lookup("TALLY_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);

        Ok(Self {
            host,
            port,
            data_path,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.address(), "0.0.0.0:5000");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TALLY_HOST", "127.0.0.1"),
            ("TALLY_PORT", "8080"),
            ("TALLY_DATA_PATH", "/var/lib/tally"),
        ]))
        .unwrap();

        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.data_path, PathBuf::from("/var/lib/tally"));
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup_from(&[("TALLY_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("TALLY_PORT"));
    }
}
