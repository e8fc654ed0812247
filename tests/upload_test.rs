mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use common::{create_test_db, create_user, json_body, session_cookie};
use quizreel::{
    db::{Db, Role},
    generator::HttpQuizGenerator,
    names, router,
    storage::LocalObjectStore,
    AppState,
};
use serde_json::json;
use tower::ServiceExt;

const BOUNDARY: &str = "quizreel-test-boundary";

async fn generate() -> impl IntoResponse {
    Json(json!({
        "transcript": "Plants turn light into sugar.",
        "quiz_questions": [
            {
                "type": "mcq",
                "question": "What do plants make?",
                "options": "[\"Sugar\", \"Salt\", \"Steel\"]",
                "answer": "\"Sugar\"",
                "order": 1,
                "correct_statement": "Plants make sugar."
            },
            {
                "type": "true-false",
                "question": "Plants need light.",
                "options": "[\"True\", \"False\"]",
                "answer": "\"True\"",
                "order": 2,
                "correct_statement": "Plants need light."
            }
        ],
        "quiz_id": "ignored",
        "status": "success"
    }))
}

async fn fail() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Transcription failed", "details": "no audio track"})),
    )
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn app_with_generator(db: Db, generator_url: String) -> Router {
    let root = std::env::temp_dir().join(format!("quizreel_upload_{}", ulid::Ulid::new()));
    let storage = LocalObjectStore::new(root, "http://localhost:1414").await.unwrap();
    router(AppState::new(db, HttpQuizGenerator::new(generator_url), storage, false))
}

fn multipart_body(fields: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_create(app: &Router, cookie: &str, body: Vec<u8>) -> axum::response::Response {
    let req = Request::builder()
        .method(Method::POST)
        .uri(names::CREATE_URL)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

#[tokio::test]
async fn educator_upload_publishes_post_and_quiz() {
    let db = create_test_db().await;
    let educator = create_user(&db, "e@example.com", Role::Educator).await;
    let cookie = session_cookie(&db, &educator).await;
    let generator = serve(Router::new().route("/generate-transcript", post(generate))).await;
    let app = app_with_generator(db.clone(), generator).await;

    let body = multipart_body(&[
        ("title", None, "Photosynthesis"),
        ("prompt", None, "How plants eat"),
        ("video", Some("lesson.mp4"), "video bytes"),
        ("thumbnail", Some("thumb.png"), "png bytes"),
    ]);
    let resp = post_create(&app, &cookie, body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let published = json_body(resp).await;
    assert_eq!(published["questions"], 2);

    let video_id = published["video_id"].as_str().unwrap();
    let video = db.video_by_id(video_id).await.unwrap().unwrap();
    assert_eq!(video.title, "Photosynthesis");
    assert_eq!(video.transcript, "Plants turn light into sugar.");
    assert!(video.video_url.ends_with(".mp4"));
    assert!(video.thumbnail_url.ends_with(".png"));

    let quiz_id = db.quiz_for_video(video_id).await.unwrap().unwrap();
    assert_eq!(quiz_id, published["quiz_id"].as_str().unwrap());
    let questions = db.questions_for_quiz(&quiz_id).await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].options, ["Sugar", "Salt", "Steel"]);
    assert_eq!(questions[1].options, ["True", "False"]);

    // the stored video is served back
    let object_id = video.video_url.rsplit('/').next().unwrap();
    let resp = common::send(&app, Method::GET, &format!("/files/{object_id}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "video/mp4");
}

#[tokio::test]
async fn missing_fields_are_rejected_before_generation() {
    let db = create_test_db().await;
    let educator = create_user(&db, "e@example.com", Role::Educator).await;
    let cookie = session_cookie(&db, &educator).await;
    let app = app_with_generator(db.clone(), "http://127.0.0.1:9".to_string()).await;

    let body = multipart_body(&[
        ("title", None, "Photosynthesis"),
        ("video", Some("lesson.mp4"), "video bytes"),
    ]);
    let resp = post_create(&app, &cookie, body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error = json_body(resp).await;
    assert_eq!(error["error"], "missing required fields: prompt, thumbnail");
    assert!(db.all_videos().await.unwrap().is_empty());
}

#[tokio::test]
async fn generation_failure_surfaces_details() {
    let db = create_test_db().await;
    let educator = create_user(&db, "e@example.com", Role::Educator).await;
    let cookie = session_cookie(&db, &educator).await;
    let generator = serve(Router::new().route("/generate-transcript", post(fail))).await;
    let app = app_with_generator(db.clone(), generator).await;

    let body = multipart_body(&[
        ("title", None, "Photosynthesis"),
        ("prompt", None, "How plants eat"),
        ("video", Some("lesson.mp4"), "video bytes"),
        ("thumbnail", Some("thumb.png"), "png bytes"),
    ]);
    let resp = post_create(&app, &cookie, body).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let error = json_body(resp).await;
    assert!(error["error"].as_str().unwrap().ends_with("no audio track"));
    assert!(db.all_videos().await.unwrap().is_empty());
}
