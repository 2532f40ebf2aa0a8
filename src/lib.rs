//! Song Catalog Server Library
//!
//! Exposes the record access layer, its store and lookup collaborators and
//! the HTTP shell, for the binary and the end-to-end tests.

pub mod config;
pub mod lookup;
pub mod server;
pub mod song_store;
pub mod songs;
pub mod sqlite_persistence;

pub use lookup::{MetadataLookup, MetadataLookupClient};
pub use server::{run_server, RequestsLoggingLevel};
pub use song_store::{RecordStore, SqliteRecordStore};
pub use songs::SongAccess;
