use axum::{
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    names,
    rejections::{AppError, ResultExt},
    utils, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::HOME_URL, get(homepage))
        .route("/files/{id}", get(file))
}

#[derive(Deserialize)]
struct HomeQuery {
    notice: Option<String>,
}

async fn homepage(Query(query): Query<HomeQuery>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "quizreel",
        "version": utils::VERSION,
        "notice": query.notice,
    }))
}

async fn file(
    State(state): State<AppState>,
    Path(object_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (bytes, content_type) = state
        .storage
        .read(&object_id)
        .await
        .reject("could not read stored file")?
        .ok_or(AppError::NotFound("file not found"))?;

    Ok(([(CONTENT_TYPE, content_type)], bytes))
}
