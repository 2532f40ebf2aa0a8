//! SQLite schema definitions for the song catalog database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// Songs table - one row per catalogued song.
///
/// `AUTOINCREMENT` keeps ids strictly increasing, so a deleted id is never
/// handed out again.
pub const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("music_group", &SqlType::Text, non_null = true),
        sqlite_column!("song", &SqlType::Text, non_null = true),
        sqlite_column!("release_date", &SqlType::Text, non_null = true), // free-form, e.g. '16.07.2006'
        sqlite_column!("text", &SqlType::Text, non_null = true), // verses separated by a blank line
        sqlite_column!("link", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_songs_music_group", "music_group"),
        ("idx_songs_song", "song"),
    ],
};

pub const SONGS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[SONGS_TABLE],
    migration: None,
}];
