//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestClient, TestServer};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_get_song() {
//!     let server = TestServer::spawn_seeded().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.get_song(1).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

// Each test binary uses a different subset of the harness.
#[allow(dead_code)]
mod client;
#[allow(dead_code)]
mod constants;
#[allow(dead_code)]
mod fixtures;
mod server;

pub use client::TestClient;
#[allow(unused_imports)]
pub use constants::*;
pub use server::TestServer;

#[allow(unused_imports)]
pub use fixtures::{find_fixture, FIXTURE_SONGS};
