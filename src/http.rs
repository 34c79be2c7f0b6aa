use crate::metrics::Metrics;
use crate::surface::{Board, Surface};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct HttpAppState {
    pub metrics: Arc<Metrics>,
    pub board: Arc<RwLock<Board>>,
}

pub fn build_router(metrics: Arc<Metrics>, board: Arc<RwLock<Board>>) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/api/panels", get(panels_handler))
        .with_state(HttpAppState { metrics, board })
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler(State(state): State<HttpAppState>) -> Response {
    state.metrics.inc_scrape_count();
    match state.metrics.encode_metrics() {
        Ok(encoded) => {
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {err}"),
        )
            .into_response(),
    }
}

async fn panels_handler(
    State(state): State<HttpAppState>,
) -> Json<BTreeMap<&'static str, Surface>> {
    let board = state.board.read().await;
    Json(board.to_named())
}

async fn page_handler(State(state): State<HttpAppState>) -> Html<String> {
    let board = state.board.read().await;
    Html(board.render_page())
}
