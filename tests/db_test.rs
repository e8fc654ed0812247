mod common;

use chrono::Utc;
use common::{create_quiz, create_test_db, create_user, create_video};
use quizreel::db::{QuizStats, Role};
use quizreel::quiz::{QuizResultDraft, ResultSink};

#[tokio::test]
async fn user_roundtrip_and_password_check() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "ada@example.com", Role::Educator).await;

    let user = db
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(user.id, user_id);
    assert_eq!(user.username, "ada");
    assert!(user.is_educator());
    assert!(user.avatar.contains("name=ada"));

    assert!(db
        .verify_user_password("ada@example.com", "password123")
        .await
        .unwrap());
    assert!(!db
        .verify_user_password("ada@example.com", "wrong-password")
        .await
        .unwrap());
    assert!(!db
        .verify_user_password("nobody@example.com", "password123")
        .await
        .unwrap());
    assert!(db.email_exists("ada@example.com").await.unwrap());
}

#[tokio::test]
async fn sessions_resolve_until_deleted() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "s@example.com", Role::Student).await;

    let first = db.create_user_session(&user_id).await.unwrap();
    let second = db.create_user_session(&user_id).await.unwrap();
    assert_eq!(db.sessions_for_user(&user_id).await.unwrap().len(), 2);

    let user = db.get_user_by_session(&first).await.unwrap().unwrap();
    assert_eq!(user.id, user_id);

    db.delete_user_session(&first).await.unwrap();
    assert!(db.get_user_by_session(&first).await.unwrap().is_none());
    assert!(db.get_user_by_session(&second).await.unwrap().is_some());

    assert_eq!(db.delete_sessions_for_user(&user_id).await.unwrap(), 1);
    assert!(db.get_user_by_session(&second).await.unwrap().is_none());
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "p@example.com", Role::Student).await;

    assert!(!db
        .change_password(&user_id, "not-it", "new-password")
        .await
        .unwrap());
    assert!(db
        .change_password(&user_id, "password123", "new-password")
        .await
        .unwrap());
    assert!(db
        .verify_user_password("p@example.com", "new-password")
        .await
        .unwrap());
}

#[tokio::test]
async fn latest_videos_are_newest_first_and_limited() {
    let db = create_test_db().await;
    let creator = create_user(&db, "e@example.com", Role::Educator).await;

    let mut ids = Vec::new();
    for i in 0..9 {
        ids.push(create_video(&db, &creator, &format!("Lesson {i}")).await);
    }

    let latest = db.latest_videos(7).await.unwrap();
    assert_eq!(latest.len(), 7);
    assert_eq!(latest[0].id, ids[8]);
    assert_eq!(latest[0].creator.id, creator);
    assert_eq!(latest[0].creator.username, "e");

    let all = db.all_videos().await.unwrap();
    assert_eq!(all.len(), 9);
    assert_eq!(all.last().unwrap().id, ids[0]);
}

#[tokio::test]
async fn search_matches_titles_case_insensitively() {
    let db = create_test_db().await;
    let creator = create_user(&db, "e@example.com", Role::Educator).await;
    create_video(&db, &creator, "Photosynthesis basics").await;
    create_video(&db, &creator, "Cell division").await;
    create_video(&db, &creator, "100% effort").await;

    let found = db.search_videos("PHOTO").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Photosynthesis basics");

    let literal = db.search_videos("%").await.unwrap();
    assert_eq!(literal.len(), 1);
    assert_eq!(literal[0].title, "100% effort");

    assert!(db.search_videos("geology").await.unwrap().is_empty());
}

#[tokio::test]
async fn bookmark_pair_is_unique() {
    let db = create_test_db().await;
    let creator = create_user(&db, "e@example.com", Role::Educator).await;
    let student = create_user(&db, "s@example.com", Role::Student).await;
    let video = create_video(&db, &creator, "Lesson").await;

    let first = db.create_bookmark(&student, &video).await.unwrap();
    let again = db.create_bookmark(&student, &video).await.unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(db.bookmarks_for_user(&student).await.unwrap().len(), 1);

    let videos = db.bookmarked_videos(&student).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, video);

    db.delete_bookmark(&first.id).await.unwrap();
    assert!(db.bookmark_for(&student, &video).await.unwrap().is_none());
}

#[tokio::test]
async fn only_the_author_deletes_a_comment() {
    let db = create_test_db().await;
    let creator = create_user(&db, "e@example.com", Role::Educator).await;
    let student = create_user(&db, "s@example.com", Role::Student).await;
    let video = create_video(&db, &creator, "Lesson").await;

    let comment = db.create_comment(&video, &student, "Great video").await.unwrap();
    assert_eq!(comment.username, "s");
    assert_eq!(comment.text, "Great video");

    assert!(!db.delete_comment(&comment.id, &creator).await.unwrap());
    assert_eq!(db.comments_for_video(&video).await.unwrap().len(), 1);

    assert!(db.delete_comment(&comment.id, &student).await.unwrap());
    assert!(db.comments_for_video(&video).await.unwrap().is_empty());
}

#[tokio::test]
async fn questions_decode_in_display_order() {
    let db = create_test_db().await;
    let creator = create_user(&db, "e@example.com", Role::Educator).await;
    let video = create_video(&db, &creator, "Lesson").await;
    let quiz_id = create_quiz(&db, &video, 3).await;

    assert_eq!(db.quiz_for_video(&video).await.unwrap(), Some(quiz_id.clone()));

    let questions = db.questions_for_quiz(&quiz_id).await.unwrap();
    let prompts: Vec<_> = questions.iter().map(|q| q.prompt.as_str()).collect();
    assert_eq!(prompts, ["Question 1", "Question 2", "Question 3"]);
    assert_eq!(questions[0].options, ["A", "B"]);
    assert_eq!(questions[0].answer.decode().unwrap(), "A");
}

#[tokio::test]
async fn video_without_quiz_has_none() {
    let db = create_test_db().await;
    let creator = create_user(&db, "e@example.com", Role::Educator).await;
    let video = create_video(&db, &creator, "Lesson").await;

    assert!(db.quiz_for_video(&video).await.unwrap().is_none());
}

#[tokio::test]
async fn saved_results_feed_stats() {
    let db = create_test_db().await;
    let student = create_user(&db, "s@example.com", Role::Student).await;

    for (score, total) in [(2, 3), (1, 1)] {
        db.save_result(&QuizResultDraft {
            user_id: student.clone(),
            video_id: "video-1".to_string(),
            quiz_id: "quiz-1".to_string(),
            score,
            total_questions: total,
            timestamp: Utc::now(),
        })
        .await
        .unwrap();
    }

    let results = db.results_for_user(&student).await.unwrap();
    assert_eq!(results.len(), 2);

    let stats = QuizStats::from_results(&results);
    assert_eq!(stats.total_attempts, 2);
    assert_eq!(stats.average_score, 83.3);
}
