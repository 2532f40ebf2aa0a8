//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per song catalog endpoint. When API routes
//! or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn songs_url(&self) -> String {
        format!("{}/v1/songs", self.base_url)
    }

    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /v1/songs with the given query parameters
    pub async fn search(&self, params: &[(&str, &str)]) -> Response {
        self.client
            .get(self.songs_url())
            .query(params)
            .send()
            .await
            .expect("Search request failed")
    }

    /// Searches and decodes the result, asserting a 200.
    pub async fn search_json(&self, params: &[(&str, &str)]) -> Vec<Value> {
        let response = self.search(params).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Invalid search response")
    }

    pub async fn get_song(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/{}", self.songs_url(), id))
            .send()
            .await
            .expect("Get song request failed")
    }

    pub async fn get_lyrics(&self, id: i64, page: usize, size: usize) -> Response {
        self.client
            .get(format!("{}/{}/lyrics", self.songs_url(), id))
            .query(&[("page", page), ("size", size)])
            .send()
            .await
            .expect("Lyrics request failed")
    }

    /// GET /v1/songs/{id}/lyrics with raw query parameters
    pub async fn get_lyrics_raw(&self, id: i64, query: &str) -> Response {
        self.client
            .get(format!("{}/{}/lyrics?{}", self.songs_url(), id, query))
            .send()
            .await
            .expect("Lyrics request failed")
    }

    pub async fn create_song(&self, group: &str, song: &str) -> Response {
        self.client
            .post(self.songs_url())
            .json(&json!({ "group": group, "song": song }))
            .send()
            .await
            .expect("Create song request failed")
    }

    pub async fn update_song(&self, id: i64, body: Value) -> Response {
        self.client
            .patch(format!("{}/{}", self.songs_url(), id))
            .json(&body)
            .send()
            .await
            .expect("Update song request failed")
    }

    pub async fn delete_song(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/{}", self.songs_url(), id))
            .send()
            .await
            .expect("Delete song request failed")
    }
}
