//! Configuration for toolgate servers.
//!
//! Values are layered with `figment`: built-in defaults, then a TOML file
//! (`toolgate.toml` in the working directory unless a path is given), then
//! `TOOLGATE_`-prefixed environment variables such as
//! `TOOLGATE_MAX_IN_FLIGHT=8`.

#![warn(missing_docs, clippy::pedantic)]

use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File read by [`ServerConfig::load`] when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "toolgate.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TOOLGATE_";

/// Identity and runtime knobs for an MCP server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported to clients in `initialize`.
    pub name: String,
    /// Version reported to clients in `initialize`.
    pub version: String,
    /// Fallback `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Upper bound on concurrently running tool calls. `None` is unbounded.
    pub max_in_flight: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "toolgate".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            log_filter: "info".to_owned(),
            max_in_flight: None,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then the TOML file at `path` (or [`DEFAULT_CONFIG_FILE`]),
    /// then environment overrides. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        debug!(path = %file.display(), "loading server configuration");
        Self::from_figment(
            Self::base()
                .merge(Toml::file(file))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    /// Loads defaults overlaid with a single TOML file, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the result is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        Self::from_figment(Self::base().merge(Toml::file(path)))
            .with_context(|| format!("failed to load configuration file {}", path.display()))
    }

    /// Extracts and validates a configuration from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails or the result is invalid.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: Self = figment
            .extract()
            .context("failed to load server configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending field.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            bail!("server name must not be empty");
        }
        if self.version.trim().is_empty() {
            bail!("server version must not be empty");
        }
        if self.max_in_flight == Some(0) {
            bail!("max_in_flight must be at least 1 when set");
        }
        Ok(())
    }

    /// The admission limit in the form the scheduler expects.
    #[must_use]
    pub fn max_in_flight_limit(&self) -> Option<NonZeroUsize> {
        self.max_in_flight.and_then(NonZeroUsize::new)
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.name, "toolgate");
        assert_eq!(config.log_filter, "info");
        assert!(config.max_in_flight_limit().is_none());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = ServerConfig::from_figment(
            ServerConfig::base().merge(Toml::string("name = \"calc\"\nmax_in_flight = 4\n")),
        )
        .unwrap();
        assert_eq!(config.name, "calc");
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.max_in_flight_limit(), NonZeroUsize::new(4));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = ServerConfig::from_figment(
            ServerConfig::base().merge(Toml::string("max_in_flight = 0")),
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_in_flight"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let config = ServerConfig {
            name: "  ".to_owned(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_wins_over_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                "name = \"from-file\"\nlog_filter = \"debug\"\n",
            )?;
            jail.set_env("TOOLGATE_NAME", "from-env");
            jail.set_env("TOOLGATE_MAX_IN_FLIGHT", "2");

            let config = ServerConfig::load(None).map_err(|err| err.to_string())?;
            assert_eq!(config.name, "from-env");
            assert_eq!(config.log_filter, "debug");
            assert_eq!(config.max_in_flight, Some(2));
            Ok(())
        });
    }

    #[test]
    fn explicit_file_ignores_environment() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "version = \"9.9.9\"")?;
            jail.set_env("TOOLGATE_VERSION", "0.0.1");

            let config = ServerConfig::from_file("custom.toml").map_err(|err| err.to_string())?;
            assert_eq!(config.version, "9.9.9");
            Ok(())
        });
    }
}
