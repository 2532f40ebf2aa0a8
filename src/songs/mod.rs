//! Record access for the song catalog: search, lyric pagination, partial
//! updates, creation through the metadata lookup, and deletion.

mod access;
mod error;
mod filter_query;
mod models;
mod sparse_update;
pub mod verses;

pub use access::SongAccess;
pub use error::AccessError;
pub use models::{NewSongRequest, SearchFilter, Song, SongField, SongPatch, VersePage};
