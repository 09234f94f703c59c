mod health;

use std::net::SocketAddr;

use axum::Router;
use switchboard_config::Config;
use switchboard_llm::GatewayState;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if provider client initialization fails
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        let state = GatewayState::from_config(config)?;

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.merge(
                Router::new()
                    .route(&config.server.health.path, axum::routing::get(health::health_handler))
                    .with_state(state.clone()),
            );
        }

        app = app.merge(switchboard_llm::gateway_router(state));

        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }

    /// Serve until the process receives `SIGINT` or `SIGTERM`
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve_until_signalled(self) -> anyhow::Result<()> {
        let shutdown = tokio_util::sync::CancellationToken::new();
        let trigger = shutdown.clone();

        tokio::spawn(async move {
            termination_signal().await;
            trigger.cancel();
        });

        self.serve(shutdown).await
    }
}

/// Resolve when the process receives a termination signal
async fn termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut terminate = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");

    tracing::info!("shutdown signal received");
}
