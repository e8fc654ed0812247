use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::{
    db::QuizStats,
    extractors::AuthGuard,
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/{id}", get(profile))
}

/// Educators list their posts; students list their attempts and stats.
async fn profile(
    _: AuthGuard,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = state
        .db
        .find_user_by_id(&user_id)
        .await
        .reject("could not get user")?
        .ok_or(AppError::NotFound("user not found"))?;

    let public = json!({
        "id": user.id,
        "username": user.username,
        "role": user.role,
        "avatar": user.avatar,
    });

    if user.is_educator() {
        let posts = state
            .db
            .videos_by_creator(&user.id)
            .await
            .reject("could not list posts")?;
        return Ok(Json(json!({ "user": public, "posts": posts })));
    }

    let results = state
        .db
        .results_for_user(&user.id)
        .await
        .reject("could not list quiz results")?;
    let stats = QuizStats::from_results(&results);

    Ok(Json(json!({
        "user": public,
        "results": results,
        "stats": stats,
    })))
}
