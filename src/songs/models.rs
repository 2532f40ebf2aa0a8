use super::AccessError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A catalogued song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub group: String,
    #[serde(rename = "song")]
    pub title: String,
    pub release_date: String,
    pub text: String,
    pub link: String,
}

/// Caller-supplied seed for a new song. The rest of the record comes from
/// the metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSongRequest {
    pub group: String,
    #[serde(rename = "song")]
    pub title: String,
}

impl NewSongRequest {
    pub fn new(group: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            title: title.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), AccessError> {
        if self.group.trim().is_empty() {
            return Err(AccessError::Validation("group is required".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(AccessError::Validation("song is required".to_string()));
        }
        Ok(())
    }
}

/// Search criteria. Every string filter is optional and an absent (or empty)
/// one matches every song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub group: Option<String>,
    pub title: Option<String>,
    pub release_date_contains: Option<String>,
    pub text_contains: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl SearchFilter {
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            group: None,
            title: None,
            release_date_contains: None,
            text_contains: None,
            limit,
            offset,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_release_date(mut self, release_date: impl Into<String>) -> Self {
        self.release_date_contains = Some(release_date.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_contains = Some(text.into());
        self
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

/// The updatable columns of a song, in the order updates are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SongField {
    Group,
    Title,
    ReleaseDate,
    Text,
    Link,
}

impl SongField {
    pub fn column(self) -> &'static str {
        match self {
            SongField::Group => "music_group",
            SongField::Title => "song",
            SongField::ReleaseDate => "release_date",
            SongField::Text => "text",
            SongField::Link => "link",
        }
    }
}

/// The fields a caller wants to change, nothing else.
///
/// An empty value counts as "not supplied": there is no way to blank out a
/// column through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongPatch {
    fields: BTreeMap<SongField, String>,
}

impl SongPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: SongField, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
    }

    pub fn with(mut self, field: SongField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Present fields in [`SongField`] order, whatever order they were set in.
    pub fn fields(&self) -> impl Iterator<Item = (SongField, &str)> {
        self.fields
            .iter()
            .map(|(field, value)| (*field, value.as_str()))
    }
}

/// A window of verses taken from a song's lyrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VersePage {
    pub verses: Vec<String>,
}
