//! Serve command handler

use crate::config::StoreBackend;
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::server::Server;
use crate::services::notifications::SmtpNotifier;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Runs the server, or with `dry_run` only checks that it could start.
    pub async fn execute(self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }

        Server::new(self.config).run().await.map_err(AppError::from)
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());

        match self.config.database.backend {
            StoreBackend::Postgres => println!("✓ Task store: postgres"),
            StoreBackend::Memory => println!("✓ Task store: memory (tasks are not persisted)"),
        }

        SmtpNotifier::from_config(&self.config.mail).map_err(|e| AppError::Validation {
            field: "mail".to_string(),
            reason: e.to_string(),
        })?;
        println!(
            "✓ Mail transport: {}:{} as {}",
            self.config.mail.host,
            self.config.mail.port,
            self.config.mail.sender()
        );

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
