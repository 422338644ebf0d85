//! Server configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the TOML file passed with `--config` (optional)
//! 3. the bare `PORT` variable
//! 4. `THAIID__*` variables, `__` separating nested keys
//!    (`THAIID__READER__BACKEND=mock`)
//!
//! Command line flags are applied on top by the binary.
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 3000
//!
//! [reader]
//! backend = "pcsc"
//! reader_name = "ACS"
//! poll_interval_ms = 10
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thaiid_core::constants::{DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT, DEFAULT_POLL_INTERVAL_MS};
use thaiid_core::{Error, Result};
use thaiid_hardware::ReaderManagerConfig;

/// Prefix of the environment variables read by [`ServerConfig::load`].
pub const ENV_PREFIX: &str = "THAIID";

/// Which reader driver to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReaderBackend {
    /// Simulated reader with a fixture card.
    #[default]
    Mock,

    /// PC/SC smart-card readers.
    Pcsc,
}

/// Reader settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub backend: ReaderBackend,

    /// Only watch PC/SC readers whose name contains this string.
    pub reader_name: Option<String>,

    /// JSON card fixture for the mock reader. The built-in sample card is
    /// used when unset.
    pub fixture: Option<PathBuf>,

    pub poll_interval_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            backend: ReaderBackend::Mock,
            reader_name: None,
            fixture: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ReaderConfig {
    /// Event pump settings for these reader settings.
    pub fn manager_config(&self) -> ReaderManagerConfig {
        ReaderManagerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..ReaderManagerConfig::default()
        }
    }
}

/// Runtime server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub reader: ReaderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            reader: ReaderConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `path` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a source cannot be read or the merged
    /// settings do not deserialize.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_from(path, std::env::vars().collect())
    }

    /// Load from `path` and the given environment variables.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a source cannot be read or the merged
    /// settings do not deserialize.
    pub fn load_from(path: &Path, vars: HashMap<String, String>) -> Result<Self> {
        let port: HashMap<String, String> = vars
            .get("PORT")
            .map(|port| HashMap::from([("PORT".to_string(), port.clone())]))
            .unwrap_or_default();

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::default().source(Some(port)))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .source(Some(vars)),
            )
            .build()
            .map_err(config_error)?;

        settings.try_deserialize().map_err(config_error)
    }

    /// Address to bind, `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check settings that deserialize fine but cannot run.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the PC/SC backend is selected in a build
    /// without the `pcsc` feature, or when a fixture is set for it.
    pub fn validate(&self) -> Result<()> {
        if self.reader.backend == ReaderBackend::Pcsc {
            if !cfg!(feature = "pcsc") {
                return Err(Error::Config(
                    "reader backend \"pcsc\" requires the pcsc feature".to_string(),
                ));
            }
            if self.reader.fixture.is_some() {
                return Err(Error::Config(
                    "reader.fixture only applies to the mock backend".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn config_error(err: config::ConfigError) -> Error {
    Error::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn missing_file() -> PathBuf {
        PathBuf::from("/nonexistent/thaiid.toml")
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = ServerConfig::load_from(&missing_file(), HashMap::new()).unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.reader.backend, ReaderBackend::Mock);
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "host = \"127.0.0.1\"\nport = 8080\n\n[reader]\nreader_name = \"ACS\"\npoll_interval_ms = 25"
        )
        .unwrap();

        let config = ServerConfig::load_from(file.path(), HashMap::new()).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.reader.reader_name.as_deref(), Some("ACS"));
        assert_eq!(
            config.reader.manager_config().poll_interval,
            Duration::from_millis(25)
        );
        assert_eq!(config.reader.backend, ReaderBackend::Mock);
    }

    #[test]
    fn test_bare_port_variable() {
        let config =
            ServerConfig::load_from(&missing_file(), vars(&[("PORT", "4000")])).unwrap();
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn test_prefixed_variables_win() {
        let config = ServerConfig::load_from(
            &missing_file(),
            vars(&[
                ("PORT", "4000"),
                ("THAIID__PORT", "5000"),
                ("THAIID__READER__FIXTURE", "/tmp/card.json"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.reader.fixture, Some(PathBuf::from("/tmp/card.json")));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let result = ServerConfig::load_from(&missing_file(), vars(&[("PORT", "http")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_mock() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_pcsc() {
        let mut config = ServerConfig::default();
        config.reader.backend = ReaderBackend::Pcsc;

        assert_eq!(config.validate().is_ok(), cfg!(feature = "pcsc"));

        config.reader.fixture = Some(PathBuf::from("card.json"));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
