//! Test fixtures: the songs known to the stub metadata service.

use super::constants::*;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

pub struct FixtureSong {
    pub group: &'static str,
    pub song: &'static str,
    pub release_date: &'static str,
    pub text: &'static str,
    pub link: &'static str,
}

pub const FIXTURE_SONGS: &[FixtureSong] = &[
    FixtureSong {
        group: MUSE,
        song: SUPERMASSIVE,
        release_date: SUPERMASSIVE_RELEASE_DATE,
        text: "Ooh baby, don't you know I suffer?\nOoh baby, can you hear me moan?\n\nYou set my soul alight\n\nSupermassive black hole",
        link: "https://www.youtube.com/watch?v=Xsp3_a-PMTw",
    },
    FixtureSong {
        group: MUSE,
        song: UPRISING,
        release_date: "07.08.2009",
        text: "Paranoia is in bloom\n\nThey will not force us\n\nThey will not control us",
        link: "https://www.youtube.com/watch?v=w8KQmps-Sog",
    },
    FixtureSong {
        group: QUEEN,
        song: BOHEMIAN,
        release_date: "31.10.1975",
        text: "Is this the real life?\r\nIs this just fantasy?\r\n\r\nMama, just killed a man",
        link: "https://www.youtube.com/watch?v=fJ9rUzIMcZQ",
    },
];

pub fn find_fixture(group: &str, song: &str) -> Option<&'static FixtureSong> {
    FIXTURE_SONGS
        .iter()
        .find(|fixture| fixture.group == group && fixture.song == song)
}

#[derive(Deserialize)]
struct InfoParams {
    group: String,
    song: String,
}

async fn song_info(Query(params): Query<InfoParams>) -> Response {
    match find_fixture(&params.group, &params.song) {
        // The misspelled key is what the real service sends.
        Some(fixture) => Json(json!({
            "relaseDate": fixture.release_date,
            "text": fixture.text,
            "link": fixture.link,
        }))
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Router of the stub metadata service: `GET /info?group=..&song=..`.
pub fn metadata_stub_router() -> Router {
    Router::new().route("/info", get(song_info))
}
