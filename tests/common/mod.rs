//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which writes a segment index file into a temp
//! directory and starts Axum on a random port for HTTP-level testing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use segplay::config::Config;
use segplay::server::{create_router, AppContext};
use tempfile::TempDir;

pub struct TestHarness {
    pub index_path: PathBuf,
    _dir: TempDir,
}

impl TestHarness {
    /// Start a server whose index file does not exist yet.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::start(None).await
    }

    /// Start a server with the given index entries.
    pub async fn with_index(entries: &[&str]) -> (Self, SocketAddr) {
        let json = serde_json::to_string(entries).expect("failed to encode index");
        Self::start(Some(json)).await
    }

    /// Start a server with raw index file contents.
    pub async fn with_index_raw(raw: &str) -> (Self, SocketAddr) {
        Self::start(Some(raw.to_string())).await
    }

    async fn start(index_contents: Option<String>) -> (Self, SocketAddr) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let index_path = dir.path().join("m3u8_index_cache.json");
        if let Some(contents) = index_contents {
            std::fs::write(&index_path, contents).expect("failed to write index");
        }

        let mut config = Config::default();
        config.index.path = index_path.clone();

        let ctx = AppContext {
            config: Arc::new(config),
        };
        let app = create_router(ctx);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (
            Self {
                index_path,
                _dir: dir,
            },
            addr,
        )
    }

    /// Replace the index file contents while the server is running.
    pub fn write_index(&self, entries: &[&str]) {
        let json = serde_json::to_string(entries).expect("failed to encode index");
        std::fs::write(&self.index_path, json).expect("failed to write index");
    }
}

/// Client that does not follow redirects, so redirect responses can be
/// asserted directly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build client")
}
