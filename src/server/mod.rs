//! HTTP server serving the to-do list.

pub mod error;
pub mod health;
pub mod routes;
pub mod shutdown;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{Config, ConfigError};
use crate::render::{RenderError, Renderer};
use crate::server::routes::{build_router, AppState};
use crate::server::shutdown::{track_in_flight, ShutdownManager};
use crate::store::ItemStore;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load templates: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("try_bind() must be called before run()")]
    NotBound,
}

pub struct TodoServer {
    pub addr: SocketAddr,
    /// The bound listener. Populated by try_bind(), consumed by run().
    listener: Option<TcpListener>,
    state: AppState,
    static_dir: Option<PathBuf>,
    grace: Duration,
    shutdown: Arc<ShutdownManager>,
}

impl TodoServer {
    pub fn new(config: &Config, store: Arc<dyn ItemStore>) -> Result<Self, ServerError> {
        config.validate()?;
        let renderer =
            Arc::new(Renderer::new()?.with_stylesheet(config.server.static_dir.is_some()));
        Ok(Self {
            addr: config.bind_addr()?,
            listener: None,
            state: AppState::new(store, renderer),
            static_dir: config.server.static_dir.as_ref().map(PathBuf::from),
            grace: Duration::from_secs(config.server.shutdown_grace_seconds),
            shutdown: Arc::new(ShutdownManager::new()),
        })
    }

    /// Bind the configured address and keep the listener until [`TodoServer::run`].
    ///
    /// Returns the actual address, which differs from the configured one
    /// when port 0 was requested.
    pub async fn try_bind(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })?;
        self.addr = listener.local_addr()?;
        self.listener = Some(listener);
        tracing::info!("Server bound to {}", self.addr);
        Ok(self.addr)
    }

    /// The full application router, including in-flight tracking.
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.static_dir.as_deref()).layer(
            middleware::from_fn_with_state(self.shutdown.clone(), track_in_flight),
        )
    }

    pub fn shutdown_handle(&self) -> Arc<ShutdownManager> {
        self.shutdown.clone()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Serve until shutdown is signalled, then let open requests finish.
    ///
    /// Requests still running once the grace period has elapsed are
    /// abandoned and `run` returns anyway.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let listener = self.listener.take().ok_or(ServerError::NotBound)?;

        tracing::info!("Starting server on {}", self.addr);

        let app = self.router();
        let shutdown = self.shutdown.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                if let Err(e) = shutdown.wait_for_shutdown().await {
                    tracing::error!("Failed to listen for shutdown signals: {}", e);
                }
            })
            .into_future();

        let grace = self.grace;
        let deadline = async {
            self.shutdown.signalled().await;
            tracing::info!(
                active = self.shutdown.in_flight(),
                grace_seconds = grace.as_secs(),
                "Waiting for in-flight requests"
            );
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = serve => {
                result?;
                tracing::info!("Server stopped");
            }
            _ = deadline => {
                tracing::warn!(
                    remaining = self.shutdown.in_flight(),
                    "Forced shutdown after grace period"
                );
            }
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<ShutdownManager>,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        self.shutdown.signal_shutdown();
    }
}
