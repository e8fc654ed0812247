use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::VideoPost,
    extractors::{AuthGuard, EducatorGuard},
    names,
    rejections::{AppError, ResultExt},
    services::upload::{UploadFile, UploadForm, UploadOutcome},
    AppState,
};

pub fn routes() -> Router<AppState> {
    let create = Router::new()
        .route(names::CREATE_URL, get(create_page).post(create_post))
        .layer(DefaultBodyLimit::max(names::MAX_UPLOAD_BYTES));

    Router::new()
        .route("/videos", get(list_videos))
        .route("/videos/latest", get(latest_videos))
        .route("/videos/search", get(search_videos))
        .route("/videos/playing", delete(stop_playing))
        .route("/videos/{id}", get(video))
        .route("/videos/{id}/play", post(play))
        .merge(create)
}

async fn list_videos(
    _: AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoPost>>, AppError> {
    let videos = state.db.all_videos().await.reject("could not list videos")?;
    Ok(Json(videos))
}

async fn latest_videos(
    _: AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoPost>>, AppError> {
    let videos = state
        .db
        .latest_videos(names::TRENDING_LIMIT)
        .await
        .reject("could not list latest videos")?;
    Ok(Json(videos))
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
}

async fn search_videos(
    _: AuthGuard,
    State(state): State<AppState>,
    Query(SearchQuery { query }): Query<SearchQuery>,
) -> Result<Json<Vec<VideoPost>>, AppError> {
    let query = query.trim();
    let videos = if query.is_empty() {
        state.db.all_videos().await
    } else {
        state.db.search_videos(query).await
    }
    .reject("could not search videos")?;
    Ok(Json(videos))
}

async fn video(
    AuthGuard { user, token }: AuthGuard,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let video = state
        .db
        .video_by_id(&video_id)
        .await
        .reject("could not get video")?
        .ok_or(AppError::NotFound("video not found"))?;

    let mut bookmarks = state.contexts.bookmarks(&token);
    let bookmarked = state
        .engagement
        .is_bookmarked(&user.id, &video_id, &mut bookmarks)
        .await
        .reject("could not load bookmarks")?;
    state.contexts.store_bookmarks(&token, bookmarks);

    Ok(Json(json!({
        "video": video,
        "bookmarked": bookmarked,
        "playing": state.contexts.playing(&token).as_deref() == Some(video_id.as_str()),
    })))
}

/// Plays the video, or pauses it when it is the one already playing.
async fn play(
    AuthGuard { token, .. }: AuthGuard,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .db
        .video_by_id(&video_id)
        .await
        .reject("could not get video")?
        .ok_or(AppError::NotFound("video not found"))?;

    let playing = state
        .contexts
        .toggle_playing(&token, &video_id)
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(json!({ "playing": playing })))
}

async fn stop_playing(AuthGuard { token, .. }: AuthGuard, State(state): State<AppState>) -> StatusCode {
    state.contexts.stop_playing(&token);
    StatusCode::NO_CONTENT
}

async fn create_page(EducatorGuard { user, .. }: EducatorGuard) -> Json<serde_json::Value> {
    Json(json!({
        "creator": user,
        "fields": ["title", "prompt", "video", "thumbnail"],
    }))
}

async fn read_file(field: Field<'_>) -> Result<UploadFile, AppError> {
    let file_name = field
        .file_name()
        .or(field.name())
        .unwrap_or("upload")
        .to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.reject_input()?;

    Ok(UploadFile {
        file_name,
        content_type,
        bytes,
    })
}

async fn create_post(
    EducatorGuard { user, .. }: EducatorGuard,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<axum::response::Response, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.reject_input()? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = field.text().await.reject_input()?,
            "prompt" => form.prompt = field.text().await.reject_input()?,
            "video" => form.video = Some(read_file(field).await?),
            "thumbnail" => form.thumbnail = Some(read_file(field).await?),
            other => tracing::debug!("ignoring unknown upload field '{other}'"),
        }
    }

    match state.upload.publish(&user.id, form).await {
        UploadOutcome::Published {
            video_id,
            quiz_id,
            questions,
        } => Ok((
            StatusCode::CREATED,
            Json(json!({
                "video_id": video_id,
                "quiz_id": quiz_id,
                "questions": questions,
                "url": names::video_url(&video_id),
            })),
        )
            .into_response()),
        UploadOutcome::MissingFields(fields) => Err(AppError::Input(format!(
            "missing required fields: {}",
            fields.join(", ")
        ))),
        UploadOutcome::Failed { step, message } => {
            Err(AppError::Upstream(format!("failed while {step}: {message}")))
        }
        UploadOutcome::Partial {
            step,
            video_id,
            quiz_id,
            questions_created,
            message,
        } => Ok((
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": format!("failed while {step}: {message}"),
                "video_id": video_id,
                "quiz_id": quiz_id,
                "questions_created": questions_created,
            })),
        )
            .into_response()),
    }
}
