use axum::{
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use ulid::Ulid;

use crate::{
    extractors::AuthGuard,
    names,
    quiz::SessionError,
    rejections::{AppError, ResultExt},
    services::quiz::{AnswerOutcome, OpenOutcome, SessionView, SubmitOutcome},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/videos/{id}/quiz", post(open_quiz))
        .route("/quiz-sessions/{id}", get(view_session).delete(cancel_session))
        .route("/quiz-sessions/{id}/answers/{index}", put(answer))
        .route("/quiz-sessions/{id}/submit", post(submit))
}

fn session_id(raw: &str) -> Result<Ulid, AppError> {
    Ulid::from_string(raw).map_err(|_| AppError::NotFound("quiz session not found"))
}

fn session_error(e: SessionError) -> AppError {
    match e {
        SessionError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
        _ => AppError::Input(e.to_string()),
    }
}

async fn open_quiz(
    AuthGuard { user, .. }: AuthGuard,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let outcome = state
        .quiz
        .open(&user.id, &video_id)
        .await
        .reject("could not load quiz questions")?;

    match outcome {
        OpenOutcome::Started(view) => {
            let location = names::quiz_session_url(&view.id);
            Ok((StatusCode::CREATED, [(LOCATION, location)], Json(view)).into_response())
        }
        OpenOutcome::NoQuiz => Err(AppError::NotFound("no quiz available for this video")),
        OpenOutcome::Discarded => Err(AppError::Conflict(
            "the quiz was closed before its questions arrived".to_string(),
        )),
    }
}

async fn view_session(
    AuthGuard { user, .. }: AuthGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    state
        .quiz
        .view(&user.id, session_id(&id)?)
        .map(Json)
        .ok_or(AppError::NotFound("quiz session not found"))
}

#[derive(Deserialize)]
struct AnswerPut {
    option: String,
}

async fn answer(
    AuthGuard { user, .. }: AuthGuard,
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
    Json(body): Json<AnswerPut>,
) -> Result<Json<SessionView>, AppError> {
    match state
        .quiz
        .answer(&user.id, session_id(&id)?, index, &body.option)
    {
        AnswerOutcome::Recorded(view) => Ok(Json(view)),
        AnswerOutcome::Rejected(e) => Err(session_error(e)),
        AnswerOutcome::NotFound => Err(AppError::NotFound("quiz session not found")),
    }
}

async fn submit(
    AuthGuard { user, .. }: AuthGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match state.quiz.submit(&user.id, session_id(&id)?).await {
        SubmitOutcome::Submitted { submission, view } => Ok(Json(json!({
            "score": submission.score,
            "percentage": submission.score.percentage(),
            "persisted": submission.persisted,
            "warning": submission.warning,
            "session": view,
        }))),
        SubmitOutcome::Rejected(e) => Err(session_error(e)),
        SubmitOutcome::NotFound => Err(AppError::NotFound("quiz session not found")),
    }
}

async fn cancel_session(
    AuthGuard { user, .. }: AuthGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.quiz.cancel(&user.id, session_id(&id)?) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("quiz session not found"))
    }
}
