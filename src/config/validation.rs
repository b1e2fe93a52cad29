//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, FileSettings, JobsConfig, LoggerSettings, MailConfig, MailSecurity,
    ServerConfig, Settings, StoreBackend,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Valid rotation periods
const VALID_ROTATIONS: &[&str] = &["never", "minutely", "hourly", "daily"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Shutdown timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.shutdown_timeout == 0 {
            return Err(ConfigError::validation(
                "server.shutdown_timeout",
                "Shutdown timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// The URL is only required for the postgres backend. Pool sizes are
    /// checked regardless so a later switch of backend does not surprise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StoreBackend::Postgres {
            self.validate_url()?;
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }

    /// Validate that a usable Postgres URL is configured
    pub fn validate_url(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        if !VALID_ROTATIONS.contains(&self.rotation.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.rotation".to_string(),
                message: format!(
                    "Invalid rotation '{}'. Valid values are: {}",
                    self.rotation,
                    VALID_ROTATIONS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// The level may be a bare level or a full `EnvFilter` directive list;
    /// only bare levels are checked against the known set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        let is_directive = level.contains('=') || level.contains(',');
        if !is_directive && !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl JobsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mail_subject.trim().is_empty() {
            return Err(ConfigError::validation(
                "jobs.mail_subject",
                "Mail subject cannot be empty.",
            ));
        }

        if self.send_timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "jobs.send_timeout_seconds",
                "Send timeout must be greater than 0 seconds.",
            ));
        }

        if self.store_timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "jobs.store_timeout_seconds",
                "Store timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl MailConfig {
    /// Validate SMTP settings
    ///
    /// Credentials are optional, but a username without a password (or the
    /// reverse) is almost always a deployment mistake.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation("mail.host", "SMTP host is required."));
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "mail.port",
                "SMTP port must be between 1 and 65535.",
            ));
        }

        if self.username.is_empty() != self.password.is_empty() {
            return Err(ConfigError::validation(
                "mail.password",
                "SMTP username and password must be set together.",
            ));
        }

        if self.security == MailSecurity::None && !self.password.is_empty() {
            tracing::warn!(
                host = %self.host,
                "SMTP credentials configured without transport security"
            );
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "mail.timeout_seconds",
                "SMTP timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// This method validates all sub-configurations and returns the first
    /// validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logger.validate()?;
        self.jobs.validate()?;
        self.mail.validate()?;
        Ok(())
    }
}
