use crate::lookup::LookupError;
use crate::song_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`super::SongAccess`].
#[derive(Debug, Error)]
pub enum AccessError {
    /// Malformed or empty caller input. Never reaches the store.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The metadata service could not describe the song; nothing was written.
    #[error("Metadata lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Store call exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("Song {0} not found")]
    NotFound(i64),
}
