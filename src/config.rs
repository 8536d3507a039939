//! Saved controller configuration.
//!
//! Only front-ends read this; dispatch, discovery and timers take an already
//! validated [`DeviceAddress`].

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::address::DeviceAddress;
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// The device a front-end talks to by default.
///
/// Stored as `{"ip": "...", "port": "..."}`. Both fields are kept as text so a
/// hand-edited file with a bad value can still be loaded and reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: String,
}

impl Config {
    pub const FILE_NAME: &'static str = ".lumina-config.json";
    pub const IP_VAR: &'static str = "WIZ_IP";
    pub const PORT_VAR: &'static str = "WIZ_PORT";

    pub fn new(address: &DeviceAddress) -> Self {
        Config {
            ip: address.ip().to_string(),
            port: address.port().to_string(),
        }
    }

    /// `~/.lumina-config.json`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(Self::FILE_NAME))
    }

    /// Load the saved config, falling back to `WIZ_IP` / `WIZ_PORT` when no
    /// config file exists.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_or_env(&path),
            None => Self::from_env(),
        }
    }

    fn load_or_env(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using environment", path.display());
                Self::from_env()
            }
            Err(e) => Err(Error::config(path, e)),
        }
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::config(path, e))?;
        Self::parse(path, &text)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::var(Self::IP_VAR).ok(), env::var(Self::PORT_VAR).ok())
    }

    fn from_vars(ip: Option<String>, port: Option<String>) -> Result<Self> {
        let ip = ip.unwrap_or_default();
        let port = port.unwrap_or_default();
        if ip.is_empty() || port.is_empty() {
            return Err(Error::config(
                format!("${}/${}", Self::IP_VAR, Self::PORT_VAR),
                "no device configured",
            ));
        }
        let config = Config { ip, port };
        config.address()?;
        Ok(config)
    }

    fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(text).map_err(|e| Error::config(path, e))?;
        if config.port.is_empty() {
            config.port = DeviceAddress::DEFAULT_PORT.to_string();
        }
        config.address().map_err(|e| Error::config(path, e))?;
        Ok(config)
    }

    /// Validate into a device address.
    pub fn address(&self) -> Result<DeviceAddress> {
        DeviceAddress::parse(&self.ip, &self.port)
    }

    /// Write the config to `~/.lumina-config.json`.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| Error::config(Self::FILE_NAME, "no home directory"))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(Error::Encoding)?;
        fs::write(path, text).map_err(|e| Error::config(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        env::temp_dir().join(format!("lumina-{}-{}.json", std::process::id(), name))
    }

    #[test]
    fn test_save_and_load() {
        let path = scratch("roundtrip");
        let address = DeviceAddress::parse("192.168.1.2", "38899").unwrap();
        Config::new(&address).save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.address().unwrap(), address);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_port_defaults() {
        let path = scratch("noport");
        fs::write(&path, r#"{"ip": "10.0.0.7"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.port, "38899");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let path = scratch("invalid");
        fs::write(&path, r#"{"ip": "10.0.0.7", "port": "70000"}"#).unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config { .. })));

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config { .. })));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_falls_back_to_vars() {
        let path = scratch("missing");
        assert!(!path.exists());
        // The environment is not set up for this test, so the fallback fails cleanly.
        if env::var_os(Config::IP_VAR).is_none() {
            assert!(matches!(
                Config::load_or_env(&path),
                Err(Error::Config { .. })
            ));
        }
    }

    #[test]
    fn test_from_vars() {
        let config =
            Config::from_vars(Some("10.0.0.7".into()), Some("38899".into())).unwrap();
        assert_eq!(config.address().unwrap().to_string(), "10.0.0.7:38899");

        assert!(Config::from_vars(None, Some("38899".into())).is_err());
        assert!(Config::from_vars(Some("10.0.0.7".into()), None).is_err());
        assert!(Config::from_vars(Some("lamp".into()), Some("38899".into())).is_err());
    }
}
