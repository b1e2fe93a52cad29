//! Server module for managing HTTP server lifecycle
//!
//! Startup order matters: the store must be reachable and every active task
//! reconciled into a timer before the listener accepts requests.

use std::sync::Arc;
use std::time::Duration;

use crate::api::routes::create_router;
use crate::config::{Environment, StoreBackend, settings::Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::jobs::{JobRegistry, TaskExecutor, reconcile};
use crate::repositories::{MemoryTaskStore, PgTaskStore, SharedTaskStore, TaskStore};
use crate::services::notifications::{Notifier, SmtpNotifier};
use crate::state::AppState;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until shutdown signal
    ///
    /// Any failure before the listener is bound (store unreachable,
    /// migrations, mail transport, scheduler) aborts startup.
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = &self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );
        tracing::info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            shutdown_timeout = settings.server.shutdown_timeout,
            "Server configuration loaded"
        );
        tracing::info!(
            level = %settings.logger.level,
            console_enabled = settings.logger.console.enabled,
            file_enabled = settings.logger.file.enabled,
            "Logger configuration loaded"
        );

        let store = self.build_store().await?;

        let notifier: Arc<dyn Notifier> = Arc::new(
            SmtpNotifier::from_config(&settings.mail).map_err(|e| {
                tracing::error!(error = %e, "Failed to configure mail transport");
                anyhow::anyhow!("Failed to configure mail transport: {}", e)
            })?,
        );
        tracing::info!(
            host = %settings.mail.host,
            port = settings.mail.port,
            security = ?settings.mail.security,
            notifier = notifier.name(),
            "Mail transport configured"
        );

        let executor = Arc::new(TaskExecutor::new(
            store.clone(),
            notifier,
            &settings.jobs,
        ));
        let gate = executor.gate();
        let registry = Arc::new(JobRegistry::new(executor, JobRegistry::new_entries()).await?);
        registry.start().await?;

        let report = reconcile(store.as_ref(), &registry).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load active tasks");
            anyhow::anyhow!("Failed to load active tasks: {}", e)
        })?;
        tracing::info!(
            scheduled = report.scheduled,
            failed = report.failed,
            "Active tasks reconciled"
        );

        let state = AppState::new(store, registry.clone(), gate);
        let router = create_router(state, &settings.server);

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        let shutdown = CancellationToken::new();
        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future();

        let result = drain(serve, shutdown, settings.server.shutdown_timeout()).await;

        if let Err(e) = registry.shutdown().await {
            tracing::warn!(error = %e, "Failed to stop job scheduler cleanly");
        }

        tracing::info!("Server shutdown complete");
        result
    }

    async fn build_store(&self) -> anyhow::Result<SharedTaskStore> {
        let database = &self.settings.database;

        match database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory task store; tasks will not survive a restart");
                Ok(Arc::new(MemoryTaskStore::new()))
            }
            StoreBackend::Postgres => {
                tracing::info!(
                    max_connections = database.max_connections,
                    min_connections = database.min_connections,
                    connection_timeout = database.connection_timeout,
                    "Initializing database connection pool"
                );

                if database.auto_migrate {
                    let applied = run_pending_migrations(&database.url).await?;
                    tracing::info!(count = applied.len(), "Pending migrations applied");
                }

                let pool = establish_async_connection_pool(database).await?;
                let store = PgTaskStore::new(pool);
                store.ping().await?;
                tracing::info!("Database connection pool initialized");

                Ok(Arc::new(store))
            }
        }
    }
}

/// Runs the server until a shutdown signal, then gives in-flight requests
/// `grace` to finish.
async fn drain<F>(serve: F, shutdown: CancellationToken, grace: Duration) -> anyhow::Result<()>
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => return result.map_err(Into::into),
        _ = shutdown_signal() => shutdown.cancel(),
    }

    match tokio::time::timeout(grace, serve).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(
                grace_seconds = grace.as_secs(),
                "In-flight requests did not finish before the shutdown timeout"
            );
            Ok(())
        }
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
///
/// A handler that cannot be installed is logged and treated as never firing.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
