//! Configuration management for cronmail
//!
//! Settings are layered, lowest priority first:
//! 1. `default.toml`
//! 2. `{environment}.toml`
//! 3. `local.toml` (not committed to version control)
//! 4. `CRONMAIL_*` environment variables, with `__` separating nested keys
//!
//! CLI flags are merged on top of the loaded settings by `cli::ConfigurationMerger`.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use loader::ConfigLoader;
pub use settings::{
    DatabaseConfig, JobsConfig, LoggerSettings, MailConfig, MailSecurity, ServerConfig, Settings,
    StoreBackend,
};
