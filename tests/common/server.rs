//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database and its own stub
//! metadata service.

use super::constants::*;
use super::fixtures::{metadata_stub_router, FIXTURE_SONGS};
use song_catalog_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use song_catalog_server::{MetadataLookupClient, SongAccess, SqliteRecordStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Test server instance with an isolated database
///
/// When dropped, the server and the metadata stub shut down and the
/// temporary database is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_txs: Vec<oneshot::Sender<()>>,
}

async fn spawn_router(router: axum::Router) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
    });

    (format!("http://127.0.0.1:{}", port), shutdown_tx)
}

impl TestServer {
    /// Spawns a server with an empty catalog.
    pub async fn spawn() -> Self {
        let (lookup_url, lookup_shutdown) = spawn_router(metadata_stub_router()).await;

        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteRecordStore::new(temp_db_dir.path().join("songs.db"), 2)
            .expect("Failed to open song store");
        let lookup =
            MetadataLookupClient::new(lookup_url, 5).expect("Failed to create lookup client");
        let songs = SongAccess::new(
            Arc::new(store),
            Arc::new(lookup),
            SongAccess::DEFAULT_CALL_TIMEOUT,
        );

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port: 0,
            cors_allow_any_origin: false,
        };
        let (base_url, app_shutdown) = spawn_router(make_app(config, songs)).await;

        let server = Self {
            base_url,
            _temp_db_dir: temp_db_dir,
            _shutdown_txs: vec![app_shutdown, lookup_shutdown],
        };
        server.wait_for_ready().await;
        server
    }

    /// Spawns a server and creates every fixture song through the API, in
    /// fixture order (ids 1, 2, 3...).
    pub async fn spawn_seeded() -> Self {
        let server = Self::spawn().await;
        let client = super::TestClient::new(server.base_url.clone());
        for fixture in FIXTURE_SONGS {
            let response = client.create_song(fixture.group, fixture.song).await;
            assert_eq!(
                response.status(),
                reqwest::StatusCode::CREATED,
                "Seeding {} failed",
                fixture.song
            );
        }
        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for tx in self._shutdown_txs.drain(..) {
            let _ = tx.send(());
        }
    }
}
