mod common;

use axum::http::{header, Method, StatusCode};
use common::{app, create_quiz, create_test_db, create_user, create_video, json_body, send, session_cookie};
use quizreel::{db::Role, names};
use serde_json::json;

struct Fixture {
    app: axum::Router,
    db: quizreel::db::Db,
    student: String,
    cookie: String,
    video: String,
}

async fn fixture(questions: usize) -> Fixture {
    let db = create_test_db().await;
    let educator = create_user(&db, "e@example.com", Role::Educator).await;
    let student = create_user(&db, "s@example.com", Role::Student).await;
    let video = create_video(&db, &educator, "Lesson").await;
    if questions > 0 {
        create_quiz(&db, &video, questions).await;
    }
    let cookie = session_cookie(&db, &student).await;

    Fixture {
        app: app(db.clone()).await,
        db,
        student,
        cookie,
        video,
    }
}

#[tokio::test]
async fn full_attempt_is_scored_and_recorded() {
    let f = fixture(12).await;

    let resp = send(&f.app, Method::POST, &format!("/videos/{}/quiz", f.video), Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let session = json_body(resp).await;
    assert_eq!(session["total"], 10);
    assert_eq!(session["phase"], "in_progress");
    assert!(session["questions"][0].get("answer").is_none());

    let id = session["id"].as_str().unwrap().to_string();
    assert_eq!(location, names::quiz_session_url(&id));

    // one wrong answer, the rest right
    for index in 0..10 {
        let option = if index == 0 { "B" } else { "A" };
        let resp = send(
            &f.app,
            Method::PUT,
            &format!("/quiz-sessions/{id}/answers/{index}"),
            Some(&f.cookie),
            Some(json!({ "option": option })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = send(&f.app, Method::POST, &format!("/quiz-sessions/{id}/submit"), Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result = json_body(resp).await;
    assert_eq!(result["score"]["correct"], 9);
    assert_eq!(result["score"]["total"], 10);
    assert_eq!(result["persisted"], true);
    assert_eq!(result["session"]["phase"], "submitted");

    let saved = f.db.results_for_user(&f.student).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].score, 9);
    assert_eq!(saved[0].total_questions, 10);
    assert_eq!(saved[0].video_id, f.video);

    // the finished session is no longer held
    let resp = send(&f.app, Method::GET, &location, Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let profile = json_body(
        send(&f.app, Method::GET, &format!("/users/{}", f.student), Some(&f.cookie), None).await,
    )
    .await;
    assert_eq!(profile["stats"]["total_attempts"], 1);
    assert_eq!(profile["stats"]["average_score"], 90.0);
    assert!(profile["user"].get("email").is_none());
}

#[tokio::test]
async fn small_quiz_asks_every_question() {
    let f = fixture(3).await;

    let resp = send(&f.app, Method::POST, &format!("/videos/{}/quiz", f.video), Some(&f.cookie), None).await;
    let session = json_body(resp).await;
    assert_eq!(session["total"], 3);
    assert_eq!(session["questions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn incomplete_attempt_cannot_be_submitted() {
    let f = fixture(2).await;

    let session = json_body(
        send(&f.app, Method::POST, &format!("/videos/{}/quiz", f.video), Some(&f.cookie), None).await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    send(
        &f.app,
        Method::PUT,
        &format!("/quiz-sessions/{id}/answers/0"),
        Some(&f.cookie),
        Some(json!({ "option": "A" })),
    )
    .await;

    let resp = send(&f.app, Method::POST, &format!("/quiz-sessions/{id}/submit"), Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("1 of 2"));

    assert!(f.db.results_for_user(&f.student).await.unwrap().is_empty());

    // still in progress and still answerable
    let resp = send(&f.app, Method::GET, &format!("/quiz-sessions/{id}"), Some(&f.cookie), None).await;
    let view = json_body(resp).await;
    assert_eq!(view["answered"], 1);
    assert_eq!(view["complete"], false);
}

#[tokio::test]
async fn answers_outside_the_question_are_rejected() {
    let f = fixture(2).await;

    let session = json_body(
        send(&f.app, Method::POST, &format!("/videos/{}/quiz", f.video), Some(&f.cookie), None).await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    let out_of_range = send(
        &f.app,
        Method::PUT,
        &format!("/quiz-sessions/{id}/answers/5"),
        Some(&f.cookie),
        Some(json!({ "option": "A" })),
    )
    .await;
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let not_a_choice = send(
        &f.app,
        Method::PUT,
        &format!("/quiz-sessions/{id}/answers/0"),
        Some(&f.cookie),
        Some(json!({ "option": "Z" })),
    )
    .await;
    assert_eq!(not_a_choice.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn video_without_questions_has_no_quiz() {
    let f = fixture(0).await;

    let resp = send(&f.app, Method::POST, &format!("/videos/{}/quiz", f.video), Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "no quiz available for this video");
}

#[tokio::test]
async fn cancelled_attempt_leaves_nothing_behind() {
    let f = fixture(4).await;

    let session = json_body(
        send(&f.app, Method::POST, &format!("/videos/{}/quiz", f.video), Some(&f.cookie), None).await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    let resp = send(&f.app, Method::DELETE, &format!("/quiz-sessions/{id}"), Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&f.app, Method::POST, &format!("/quiz-sessions/{id}/submit"), Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(f.db.results_for_user(&f.student).await.unwrap().is_empty());
}

#[tokio::test]
async fn sessions_are_private_to_their_owner() {
    let f = fixture(2).await;
    let other = create_user(&f.db, "other@example.com", Role::Student).await;
    let other_cookie = session_cookie(&f.db, &other).await;

    let session = json_body(
        send(&f.app, Method::POST, &format!("/videos/{}/quiz", f.video), Some(&f.cookie), None).await,
    )
    .await;
    let id = session["id"].as_str().unwrap();

    let resp = send(&f.app, Method::GET, &format!("/quiz-sessions/{id}"), Some(&other_cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send(&f.app, Method::DELETE, &format!("/quiz-sessions/{id}"), Some(&other_cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&f.app, Method::GET, &format!("/quiz-sessions/{id}"), Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn signing_out_discards_open_attempts() {
    let f = fixture(2).await;

    let session = json_body(
        send(&f.app, Method::POST, &format!("/videos/{}/quiz", f.video), Some(&f.cookie), None).await,
    )
    .await;
    let id = session["id"].as_str().unwrap().to_string();

    let resp = send(&f.app, Method::POST, names::SIGN_OUT_URL, Some(&f.cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let cookie = session_cookie(&f.db, &f.student).await;
    let resp = send(&f.app, Method::GET, &format!("/quiz-sessions/{id}"), Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
