#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use quizreel::{
    db::{Db, NewQuestion, NewVideo, Role},
    generator::HttpQuizGenerator,
    quiz::{EncodedAnswer, QuestionKind},
    router,
    storage::LocalObjectStore,
    utils, AppState,
};
use serde_json::Value;
use tower::ServiceExt;

fn temp_path(prefix: &str) -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("quizreel_{prefix}_{}_{}", std::process::id(), id))
}

pub async fn create_test_db() -> Db {
    let path = temp_path("test").with_extension("db");
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("file:{}", path.display());
    Db::new(url, String::new())
        .await
        .expect("failed to create test database")
}

/// Router over `db`. The generation service address is never listening.
pub async fn app(db: Db) -> Router {
    let storage = LocalObjectStore::new(temp_path("files"), "http://localhost:1414")
        .await
        .expect("failed to create test storage");
    let generator = HttpQuizGenerator::new("http://127.0.0.1:9");
    router(AppState::new(db, generator, storage, false))
}

pub async fn create_user(db: &Db, email: &str, role: Role) -> String {
    let username = email.split('@').next().unwrap_or(email);
    db.create_user(email, "password123", username, role, &utils::avatar_url(username))
        .await
        .expect("create user")
}

/// A session cookie header value for a fresh session of `user_id`.
pub async fn session_cookie(db: &Db, user_id: &str) -> String {
    let token = db.create_user_session(user_id).await.expect("create session");
    format!("{}={token}", quizreel::names::USER_SESSION_COOKIE_NAME)
}

pub async fn create_video(db: &Db, creator_id: &str, title: &str) -> String {
    db.create_video(&NewVideo {
        title: title.to_string(),
        prompt: format!("{title} prompt"),
        video_url: "http://localhost:1414/files/video.mp4".to_string(),
        thumbnail_url: "http://localhost:1414/files/thumb.png".to_string(),
        transcript: format!("Transcript of {title}"),
        creator_id: creator_id.to_string(),
    })
    .await
    .expect("create video")
}

/// Attaches a quiz of `count` two-option questions whose answer is always "A".
pub async fn create_quiz(db: &Db, video_id: &str, count: usize) -> String {
    let quiz_id = db.create_quiz(video_id).await.expect("create quiz");
    for i in 0..count {
        db.create_question(
            &quiz_id,
            &NewQuestion {
                kind: QuestionKind::MultipleChoice,
                prompt: format!("Question {}", i + 1),
                options: vec!["A".to_string(), "B".to_string()],
                answer: EncodedAnswer::encode("A"),
                order: i as i64,
                correct_statement: String::new(),
            },
        )
        .await
        .expect("create question");
    }
    quiz_id
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(req.body(body).expect("request build should succeed"))
        .await
        .expect("router should respond")
}

pub async fn json_body(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is json")
}

/// The `name=value` part of the session cookie a response sets.
pub fn set_cookie(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("response sets a cookie")
        .to_string()
}
