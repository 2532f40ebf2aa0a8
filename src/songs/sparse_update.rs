use super::{AccessError, SongPatch};
use crate::song_store::{Statement, SONGS_TABLE};

/// Builds an UPDATE that assigns exactly the fields present in `patch`.
///
/// Column names come from [`super::SongField::column`], never from caller
/// input. The id is bound after all assigned values.
pub(crate) fn update_statement(id: i64, patch: &SongPatch) -> Result<Statement, AccessError> {
    if patch.is_empty() {
        return Err(AccessError::Validation("no fields to update".to_string()));
    }

    let mut assignments = Vec::new();
    let mut values = Vec::new();
    for (field, value) in patch.fields() {
        values.push(value.to_string());
        assignments.push(format!("{} = ?{}", field.column(), values.len()));
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        SONGS_TABLE.name,
        assignments.join(", "),
        values.len() + 1
    );

    let statement = values
        .into_iter()
        .fold(Statement::new(sql), |statement, value| statement.bind(value));
    Ok(statement.bind(id))
}
