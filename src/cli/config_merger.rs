//! Merges CLI overrides onto file and environment configuration.
//!
//! Precedence, highest first: subcommand flags, global flags, then whatever
//! `ConfigLoader` produced.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base configuration the way the CLI asked for it.
    ///
    /// `--config` reads exactly that file; otherwise the layered loader runs.
    /// `--env` overrides `CRONMAIL_APP_ENV` in both cases.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match &cli.config {
            Some(path) => ConfigLoader::with_file(path),
            None => ConfigLoader::new()?,
        };
        let loader = match &cli.env {
            Some(env) => loader.with_environment(env.clone().into()),
            None => loader,
        };

        Ok(Self::new(loader.load()?))
    }

    /// Applies CLI overrides and validates the result.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(level) = log_level {
                config.logger.level = level.clone().into();
            }
        }

        config.validate()?;

        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn merger() -> ConfigurationMerger {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/test".to_string();
        ConfigurationMerger::new(config)
    }

    fn merge(args: &[&str]) -> Result<Settings, ConfigError> {
        merger().merge_cli_args(&Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_verbose_and_quiet_set_level() {
        assert_eq!(merge(&["cronmail", "--verbose"]).unwrap().logger.level, "debug");
        assert_eq!(merge(&["cronmail", "--quiet"]).unwrap().logger.level, "error");
    }

    #[test]
    fn test_serve_overrides_host_and_port() {
        let merged = merge(&["cronmail", "serve", "--host", "0.0.0.0", "--port", "8080"]).unwrap();

        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let merged = merge(&["cronmail", "--verbose", "serve", "--log-level", "warn"]).unwrap();
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_migrate_leaves_server_untouched() {
        let merged = merge(&["cronmail", "migrate"]).unwrap();
        assert_eq!(merged.server, Settings::default().server);
    }

    #[test]
    fn test_from_cli_reads_config_file() {
        let _guard = crate::config::loader::tests::TEST_MUTEX.lock().unwrap();
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[server]\nport = 4100\n\n[database]\nbackend = \"memory\"\n\n[mail]\nfrom = \"cronmail@localhost\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["cronmail", "--config", path, "serve"]).unwrap();
        let merger = ConfigurationMerger::from_cli(&cli).unwrap();

        assert_eq!(merger.config().server.port, 4100);
        assert_eq!(merger.config().database.backend, StoreBackend::Memory);
    }
}
