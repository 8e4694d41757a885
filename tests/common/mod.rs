//! Shared test utilities.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use todolist::config::{Config, DatabaseConfig, ServerConfig, StoreBackend};
use todolist::server::{ServerHandle, TodoServer};
use todolist::store::{open_store, ItemStore};

/// A server running on a random local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<dyn ItemStore>,
    pub handle: ServerHandle,
    task: tokio::task::JoinHandle<()>,
    _dir: TempDir,
}

impl TestServer {
    /// Start a server backed by a SQLite file in a temp dir.
    pub async fn start() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(&dir, StoreBackend::Sqlite);
        let store = open_store(&config.database).expect("Failed to open store");

        let mut server = TodoServer::new(&config, store.clone()).expect("Failed to create server");
        // Bind before spawning so the port is ready for requests.
        let addr = server.try_bind().await.expect("Failed to bind");
        let handle = server.handle();

        let task = tokio::spawn(async move {
            let _ = server.run().await;
        });

        Self {
            addr,
            store,
            handle,
            task,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Signal shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.handle.shutdown();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked");
    }
}

pub fn test_config(dir: &TempDir, backend: StoreBackend) -> Config {
    Config {
        server: ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            static_dir: None,
            shutdown_grace_seconds: 2,
        },
        database: DatabaseConfig {
            backend,
            path: db_path(dir).display().to_string(),
        },
    }
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("items.db")
}
