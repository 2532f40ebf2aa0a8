//! Read statements over the songs table.
//!
//! Search uses a single statement shape for every combination of filters:
//! an unset filter binds NULL and its predicate collapses to true inside
//! SQLite, so nothing here branches on which filters are present.

use super::{SearchFilter, Song};
use crate::song_store::{Row, Statement, StoreError, SONGS_TABLE};

const SONG_COLUMNS: &str = "id, music_group, song, release_date, text, link";

fn contains_predicate(column: &str, placeholder: usize) -> String {
    format!(
        "(COALESCE(?{p}, '') = '' OR instr(fold_case({column}), fold_case(?{p})) > 0)",
        p = placeholder,
        column = column
    )
}

pub(crate) fn search_statement(filter: &SearchFilter) -> Statement {
    let sql = format!(
        "SELECT {columns} FROM {table} WHERE {group} AND {title} AND {release_date} AND {text} \
         ORDER BY id ASC LIMIT ?5 OFFSET ?6",
        columns = SONG_COLUMNS,
        table = SONGS_TABLE.name,
        group = contains_predicate("music_group", 1),
        title = contains_predicate("song", 2),
        release_date = contains_predicate("release_date", 3),
        text = contains_predicate("text", 4),
    );

    Statement::new(sql)
        .bind(filter.group.clone())
        .bind(filter.title.clone())
        .bind(filter.release_date_contains.clone())
        .bind(filter.text_contains.clone())
        .bind(i64::from(filter.limit))
        .bind(i64::from(filter.offset))
}

pub(crate) fn song_by_id_statement(id: i64) -> Statement {
    Statement::new(format!(
        "SELECT {} FROM {} WHERE id = ?1",
        SONG_COLUMNS, SONGS_TABLE.name
    ))
    .bind(id)
}

pub(crate) fn lyrics_by_id_statement(id: i64) -> Statement {
    Statement::new(format!("SELECT text FROM {} WHERE id = ?1", SONGS_TABLE.name)).bind(id)
}

/// Decodes a row selected with [`SONG_COLUMNS`].
pub(crate) fn song_from_row(row: &Row) -> Result<Song, StoreError> {
    Ok(Song {
        id: row.integer(0)?,
        group: row.text(1)?,
        title: row.text(2)?,
        release_date: row.text(3)?,
        text: row.text(4)?,
        link: row.text(5)?,
    })
}
