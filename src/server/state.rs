use axum::extract::FromRef;

use crate::songs::SongAccess;
use std::time::Instant;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub songs: SongAccess,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, songs: SongAccess) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            songs,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for SongAccess {
    fn from_ref(input: &ServerState) -> Self {
        input.songs.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
