use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{debug, error, info};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use super::{log_requests, state::*, ServerConfig};
use crate::songs::{AccessError, NewSongRequest, SearchFilter, SongAccess, SongField, SongPatch};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = match &self {
            AccessError::Validation(_) => StatusCode::BAD_REQUEST,
            AccessError::NotFound(_) => StatusCode::NOT_FOUND,
            AccessError::Lookup(_) => StatusCode::BAD_GATEWAY,
            AccessError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AccessError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("{}", self);
        } else {
            debug!("{}", self);
        }
        error_response(status, self.to_string())
    }
}

/// Unwraps a JSON body, answering 400 for anything unparsable.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        error_response(StatusCode::BAD_REQUEST, rejection.body_text())
    })
}

#[derive(Deserialize, Debug, Default)]
struct SearchParams {
    group: Option<String>,
    song: Option<String>,
    release_date: Option<String>,
    text: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl From<SearchParams> for SearchFilter {
    fn from(params: SearchParams) -> Self {
        SearchFilter {
            group: params.group,
            title: params.song,
            release_date_contains: params.release_date,
            text_contains: params.text,
            limit: params.limit.unwrap_or(SearchFilter::DEFAULT_LIMIT),
            offset: params.offset.unwrap_or(0),
        }
    }
}

#[derive(Deserialize, Debug)]
struct LyricsParams {
    page: Option<usize>,
    size: Option<usize>,
}

#[derive(Deserialize, Debug)]
struct UpdateSongBody {
    group: Option<String>,
    song: Option<String>,
    release_date: Option<String>,
    text: Option<String>,
    link: Option<String>,
}

impl From<UpdateSongBody> for SongPatch {
    fn from(body: UpdateSongBody) -> Self {
        let mut patch = SongPatch::new();
        for (field, value) in [
            (SongField::Group, body.group),
            (SongField::Title, body.song),
            (SongField::ReleaseDate, body.release_date),
            (SongField::Text, body.text),
            (SongField::Link, body.link),
        ] {
            if let Some(value) = value {
                patch.set(field, value);
            }
        }
        patch
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn search_songs(
    State(songs): State<SongAccess>,
    Query(params): Query<SearchParams>,
) -> Response {
    match songs.search(params.into()).await {
        Ok(found) => Json(found).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_song(State(songs): State<SongAccess>, Path(id): Path<i64>) -> Response {
    match songs.get(id).await {
        Ok(song) => Json(song).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_lyrics(
    State(songs): State<SongAccess>,
    Path(id): Path<i64>,
    Query(params): Query<LyricsParams>,
) -> Response {
    let page = params.page.unwrap_or(1);
    let size = params.size.unwrap_or(1);
    match songs.verse_page(id, page, size).await {
        Ok(verses) => Json(verses).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn post_song(
    State(songs): State<SongAccess>,
    body: Result<Json<NewSongRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match songs.create(request).await {
        Ok(song) => (StatusCode::CREATED, Json(song)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn patch_song(
    State(songs): State<SongAccess>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateSongBody>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    match songs.update(id, body.into()).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_song(State(songs): State<SongAccess>, Path(id): Path<i64>) -> Response {
    match songs.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

fn make_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

pub fn make_app(config: ServerConfig, songs: SongAccess) -> Router {
    let state = ServerState::new(config.clone(), songs);

    let song_routes: Router = Router::new()
        .route("/", get(search_songs).post(post_song))
        .route("/{id}", get(get_song).patch(patch_song).delete(delete_song))
        .route("/{id}/lyrics", get(get_lyrics))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let mut app: Router = home_router.nest("/v1/songs", song_routes);

    if config.cors_allow_any_origin {
        app = app.layer(make_cors_layer());
    }
    app.layer(middleware::from_fn_with_state(state, log_requests))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}

pub async fn run_server(config: ServerConfig, songs: SongAccess) -> Result<()> {
    let port = config.port;
    let app = make_app(config, songs);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{LookupError, MetadataLookup, SongDetail};
    use crate::song_store::SqliteRecordStore;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    struct FixedLookup;

    #[async_trait]
    impl MetadataLookup for FixedLookup {
        async fn lookup(&self, group: &str, _title: &str) -> Result<SongDetail, LookupError> {
            if group == "Unknown" {
                return Err(LookupError::Status(404));
            }
            Ok(SongDetail {
                release_date: "16.07.2006".to_string(),
                text: "A\n\nB\n\nC".to_string(),
                link: "https://example.com/watch".to_string(),
            })
        }
    }

    fn test_app() -> (TempDir, Router) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteRecordStore::new(temp_dir.path().join("songs.db"), 1).unwrap();
        let songs = SongAccess::new(
            Arc::new(store),
            Arc::new(FixedLookup),
            SongAccess::DEFAULT_CALL_TIMEOUT,
        );
        let config = ServerConfig {
            cors_allow_any_origin: true,
            ..ServerConfig::default()
        };
        (temp_dir, make_app(config, songs))
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[test]
    fn access_errors_map_to_statuses() {
        let cases = [
            (AccessError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AccessError::NotFound(1), StatusCode::NOT_FOUND),
            (
                AccessError::Lookup(LookupError::Status(500)),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AccessError::Timeout(Duration::from_secs(3)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                AccessError::Store(crate::song_store::StoreError::Interrupted),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn home_reports_stats() {
        let (_dir, app) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["uptime"].is_string());
        assert!(json["hash"].is_string());
    }

    #[tokio::test]
    async fn create_get_and_page_lyrics() {
        let (_dir, app) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/songs",
                r#"{"group": "Muse", "song": "Uprising"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["release_date"], "16.07.2006");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/v1/songs/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, created);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/songs/1/lyrics?page=2&size=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!(["B", "C"]));
    }

    #[tokio::test]
    async fn malformed_input_is_bad_request() {
        let (_dir, app) = test_app();

        let bad_requests = vec![
            Request::builder()
                .uri("/v1/songs/abc")
                .body(Body::empty())
                .unwrap(),
            Request::builder()
                .uri("/v1/songs?limit=-1")
                .body(Body::empty())
                .unwrap(),
            Request::builder()
                .uri("/v1/songs?limit=0")
                .body(Body::empty())
                .unwrap(),
            Request::builder()
                .uri("/v1/songs/1/lyrics?page=0")
                .body(Body::empty())
                .unwrap(),
            json_request("POST", "/v1/songs", "{not json"),
            json_request("POST", "/v1/songs", r#"{"group": "Muse"}"#),
            json_request("POST", "/v1/songs", r#"{"group": "", "song": "x"}"#),
            json_request("PATCH", "/v1/songs/1", r#"{}"#),
        ];

        for request in bad_requests {
            let uri = request.uri().clone();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[tokio::test]
    async fn failed_lookup_is_bad_gateway() {
        let (_dir, app) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/songs",
                r#"{"group": "Unknown", "song": "Nothing"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = app
            .oneshot(Request::builder().uri("/v1/songs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn patch_and_delete_missing_song_are_not_found() {
        let (_dir, app) = test_app();

        let response = app
            .clone()
            .oneshot(json_request("PATCH", "/v1/songs/7", r#"{"song": "New"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/songs/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_allows_patch() {
        let (_dir, app) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/v1/songs/1")
                    .header("origin", "https://example.com")
                    .header("access-control-request-method", "PATCH")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response
            .headers()
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(allowed.contains("PATCH"));
    }
}
