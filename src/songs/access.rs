use super::filter_query::{
    lyrics_by_id_statement, search_statement, song_by_id_statement, song_from_row,
};
use super::sparse_update::update_statement;
use super::{verses, AccessError, NewSongRequest, SearchFilter, Song, SongPatch, VersePage};
use crate::lookup::MetadataLookup;
use crate::song_store::{RecordStore, Statement, StoreError, SONGS_TABLE};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// The record-access contract handlers talk to.
///
/// Every store call runs on the blocking pool under a fixed deadline that the
/// store enforces by aborting its statement once it passes. Reads are also
/// abandoned by the caller at the deadline. Writes are awaited to the end so
/// that a statement committing right at the deadline is reported as done.
#[derive(Clone)]
pub struct SongAccess {
    store: Arc<dyn RecordStore>,
    lookup: Arc<dyn MetadataLookup>,
    call_timeout: Duration,
}

type StoreTask<T> = tokio::task::JoinHandle<Result<T, AccessError>>;

impl SongAccess {
    pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(
        store: Arc<dyn RecordStore>,
        lookup: Arc<dyn MetadataLookup>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            lookup,
            call_timeout,
        }
    }

    fn spawn_store_task<T, F>(&self, work: F) -> (Instant, StoreTask<T>)
    where
        T: Send + 'static,
        F: FnOnce(&dyn RecordStore, Instant) -> Result<T, AccessError> + Send + 'static,
    {
        let deadline = Instant::now() + self.call_timeout;
        let store = self.store.clone();
        let task = tokio::task::spawn_blocking(move || work(store.as_ref(), deadline));
        (deadline, task)
    }

    fn settle<T>(
        &self,
        joined: Result<Result<T, AccessError>, tokio::task::JoinError>,
    ) -> Result<T, AccessError> {
        match joined {
            Ok(Err(AccessError::Store(StoreError::Interrupted))) => {
                Err(AccessError::Timeout(self.call_timeout))
            }
            Ok(result) => result,
            Err(join_error) => Err(AccessError::Store(StoreError::Connection(format!(
                "store task failed: {}",
                join_error
            )))),
        }
    }

    async fn with_reader<T, F>(&self, work: F) -> Result<T, AccessError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RecordStore, Instant) -> Result<T, AccessError> + Send + 'static,
    {
        let (deadline, task) = self.spawn_store_task(work);
        match tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), task).await {
            Ok(joined) => self.settle(joined),
            Err(_) => Err(AccessError::Timeout(self.call_timeout)),
        }
    }

    async fn with_writer<T, F>(&self, work: F) -> Result<T, AccessError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RecordStore, Instant) -> Result<T, AccessError> + Send + 'static,
    {
        let (_, task) = self.spawn_store_task(work);
        self.settle(task.await)
    }

    pub async fn search(&self, filter: SearchFilter) -> Result<Vec<Song>, AccessError> {
        if filter.limit < 1 {
            return Err(AccessError::Validation(
                "limit must be at least 1".to_string(),
            ));
        }
        let statement = search_statement(&filter);

        let songs = self
            .with_reader(move |store, deadline| {
                let rows = store.query(&statement, deadline)?;
                let songs = rows
                    .iter()
                    .map(song_from_row)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(songs)
            })
            .await?;
        debug!("Search {:?} matched {} songs", filter, songs.len());
        Ok(songs)
    }

    pub async fn get(&self, id: i64) -> Result<Song, AccessError> {
        let statement = song_by_id_statement(id);
        self.with_reader(move |store, deadline| {
            let rows = store.query(&statement, deadline)?;
            match rows.first() {
                Some(row) => Ok(song_from_row(row)?),
                None => Err(AccessError::NotFound(id)),
            }
        })
        .await
    }

    /// Returns the verse window of song `id` starting at verse `page`.
    pub async fn verse_page(
        &self,
        id: i64,
        page: usize,
        page_size: usize,
    ) -> Result<VersePage, AccessError> {
        if page < 1 {
            return Err(AccessError::Validation("page must be at least 1".to_string()));
        }
        if page_size < 1 {
            return Err(AccessError::Validation("size must be at least 1".to_string()));
        }

        let statement = lyrics_by_id_statement(id);
        let text = self
            .with_reader(move |store, deadline| {
                let rows = store.query(&statement, deadline)?;
                match rows.first() {
                    Some(row) => Ok(row.text(0)?),
                    None => Err(AccessError::NotFound(id)),
                }
            })
            .await?;

        Ok(VersePage {
            verses: verses::segment(&text, page, page_size),
        })
    }

    /// Looks the song up and, only if that succeeds, stores it.
    pub async fn create(&self, request: NewSongRequest) -> Result<Song, AccessError> {
        request.validate()?;

        let detail = self.lookup.lookup(&request.group, &request.title).await?;

        let statement = Statement::new(format!(
            "INSERT INTO {} (music_group, song, release_date, text, link) VALUES (?1, ?2, ?3, ?4, ?5)",
            SONGS_TABLE.name
        ))
        .bind(request.group.as_str())
        .bind(request.title.as_str())
        .bind(detail.release_date.as_str())
        .bind(detail.text.as_str())
        .bind(detail.link.as_str());

        let outcome = self
            .with_writer(move |store, deadline| Ok(store.execute(&statement, deadline)?))
            .await?;

        let song = Song {
            id: outcome.last_insert_id,
            group: request.group,
            title: request.title,
            release_date: detail.release_date,
            text: detail.text,
            link: detail.link,
        };
        info!("Created song {} \"{}\" by \"{}\"", song.id, song.title, song.group);
        Ok(song)
    }

    pub async fn update(&self, id: i64, patch: SongPatch) -> Result<(), AccessError> {
        let statement = update_statement(id, &patch)?;

        let outcome = self
            .with_writer(move |store, deadline| Ok(store.execute(&statement, deadline)?))
            .await?;
        if outcome.affected_rows == 0 {
            return Err(AccessError::NotFound(id));
        }
        info!("Updated song {}", id);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AccessError> {
        let statement =
            Statement::new(format!("DELETE FROM {} WHERE id = ?1", SONGS_TABLE.name)).bind(id);

        let outcome = self
            .with_writer(move |store, deadline| Ok(store.execute(&statement, deadline)?))
            .await?;
        if outcome.affected_rows == 0 {
            return Err(AccessError::NotFound(id));
        }
        info!("Deleted song {}", id);
        Ok(())
    }
}
