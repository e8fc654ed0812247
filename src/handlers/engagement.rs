use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::{Comment, VideoPost},
    extractors::AuthGuard,
    names,
    rejections::{AppError, ResultExt},
    services::engagement::{BookmarkOutcome, CommentOutcome, DeleteCommentOutcome},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/videos/{id}/comments", get(comments).post(add_comment))
        .route("/comments/{id}", delete(delete_comment))
        .route(names::BOOKMARKS_URL, get(bookmarks))
        .route("/videos/{id}/bookmark", post(toggle_bookmark))
}

#[derive(Deserialize)]
struct CommentsQuery {
    #[serde(default)]
    refresh: bool,
}

async fn comments(
    AuthGuard { token, .. }: AuthGuard,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let mut cache = state.contexts.comments(&token, &video_id);
    let comments = state
        .engagement
        .comments(&video_id, &mut cache, query.refresh)
        .await
        .reject("could not list comments")?;
    state.contexts.store_comments(&token, &video_id, cache);
    Ok(Json(comments))
}

#[derive(Deserialize)]
struct CommentPost {
    text: String,
}

async fn add_comment(
    AuthGuard { user, token }: AuthGuard,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(body): Json<CommentPost>,
) -> Result<impl IntoResponse, AppError> {
    let mut cache = state.contexts.comments(&token, &video_id);
    let outcome = state
        .engagement
        .add_comment(&video_id, &user.id, &body.text, &mut cache)
        .await
        .reject("could not create comment")?;

    match outcome {
        CommentOutcome::Created(comment) => {
            state.contexts.store_comments(&token, &video_id, cache);
            Ok((StatusCode::CREATED, Json(comment)))
        }
        CommentOutcome::EmptyText => Err(AppError::Input("comment cannot be empty".to_string())),
        CommentOutcome::VideoNotFound => Err(AppError::NotFound("video not found")),
    }
}

async fn delete_comment(
    AuthGuard { user, token }: AuthGuard,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let outcome = state
        .engagement
        .delete_comment(&comment_id, &user.id)
        .await
        .reject("could not delete comment")?;

    match outcome {
        DeleteCommentOutcome::Deleted(comment) => {
            state
                .contexts
                .forget_comment(&token, &comment.video_id, &comment.id);
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteCommentOutcome::NotFound => Err(AppError::NotFound("comment not found")),
        DeleteCommentOutcome::NotOwner => {
            Err(AppError::Forbidden("only the author can delete a comment"))
        }
    }
}

async fn bookmarks(
    AuthGuard { user, token }: AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoPost>>, AppError> {
    let mut cache = state.contexts.bookmarks(&token);
    let videos = state
        .engagement
        .bookmarked_videos(&user.id, &mut cache)
        .await
        .reject("could not list bookmarks")?;
    state.contexts.store_bookmarks(&token, cache);
    Ok(Json(videos))
}

async fn toggle_bookmark(
    AuthGuard { user, token }: AuthGuard,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut cache = state.contexts.bookmarks(&token);
    let outcome = state
        .engagement
        .toggle_bookmark(&user.id, &video_id, &mut cache)
        .await
        .reject("could not toggle bookmark")?;
    state.contexts.store_bookmarks(&token, cache);

    match outcome {
        BookmarkOutcome::Added(bookmark) => Ok(Json(json!({
            "bookmarked": true,
            "bookmark": bookmark,
        }))),
        BookmarkOutcome::Removed(_) => Ok(Json(json!({ "bookmarked": false }))),
        BookmarkOutcome::VideoNotFound => Err(AppError::NotFound("video not found")),
    }
}
