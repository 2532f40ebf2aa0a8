//! Outbound metadata lookup: given a group and a song title, an external
//! service supplies the release date, lyrics and link.

mod client;
mod models;

pub use client::MetadataLookupClient;
pub use models::SongDetail;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Request to metadata service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Metadata service answered with status {0}")]
    Status(u16),

    #[error("Malformed metadata response: {0}")]
    InvalidResponse(String),
}

/// Resolves the details of a song that is about to be catalogued.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, group: &str, title: &str) -> Result<SongDetail, LookupError>;
}
