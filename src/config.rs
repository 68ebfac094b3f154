// Runtime configuration from the environment (and an optional .env file)

use crate::error::{BaziError, Result};
use crate::history::HISTORY_CAPACITY;
use log::debug;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_HISTORY_FILE: &str = "fortune_history.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub history_file: PathBuf,
    pub history_capacity: usize,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Read `BAZI_HISTORY_FILE`, `BAZI_HISTORY_CAPACITY` and `BAZI_BIND_ADDR`.
    pub fn from_env() -> Result<Self> {
        if dotenv::dotenv().is_err() {
            debug!(".env not found, using process environment only");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let history_file = lookup("BAZI_HISTORY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE));

        let history_capacity = match lookup("BAZI_HISTORY_CAPACITY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(BaziError::input(format!(
                        "BAZI_HISTORY_CAPACITY must be a positive integer, got {:?}",
                        raw
                    )))
                }
            },
            None => HISTORY_CAPACITY,
        };

        let raw_addr = lookup("BAZI_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|e| BaziError::input(format!("BAZI_BIND_ADDR {:?}: {}", raw_addr, e)))?;

        Ok(Config {
            history_file,
            history_capacity,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.history_file, PathBuf::from("fortune_history.json"));
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.bind_addr, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BAZI_HISTORY_FILE", "/var/lib/bazi/history.json"),
            ("BAZI_HISTORY_CAPACITY", "250"),
            ("BAZI_BIND_ADDR", "127.0.0.1:8080"),
        ])
        .unwrap();

        assert_eq!(config.history_file, PathBuf::from("/var/lib/bazi/history.json"));
        assert_eq!(config.history_capacity, 250);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("BAZI_HISTORY_CAPACITY", "0")]).is_err());
        assert!(config_from(&[("BAZI_HISTORY_CAPACITY", "many")]).is_err());
        assert!(config_from(&[("BAZI_BIND_ADDR", "localhost")]).is_err());
    }
}
