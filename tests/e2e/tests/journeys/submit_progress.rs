//! Journey: finishing lessons and reviews, then editing notes

use chrono::{Duration, Utc};
use serde_json::Value;
use tsurukame_core::date;
use tsurukame_core::prelude::*;
use tsurukame_core::StudyMaterial;
use tsurukame_e2e_tests::{MockServer, TestDataFactory};

fn lesson(assignment_id: i64) -> PendingProgress {
    PendingProgress {
        assignment_id,
        is_lesson: true,
        meaning_wrong_count: 0,
        reading_wrong_count: 0,
        created_at: Utc::now(),
    }
}

fn review(assignment_id: i64, meaning_wrong: u32, reading_wrong: u32) -> PendingProgress {
    PendingProgress {
        assignment_id,
        is_lesson: false,
        meaning_wrong_count: meaning_wrong,
        reading_wrong_count: reading_wrong,
        created_at: Utc::now(),
    }
}

fn stage_of(server: &MockServer, assignment_id: i64) -> Option<i64> {
    server
        .snapshot()
        .assignments
        .iter()
        .find(|a| a.id == assignment_id)
        .and_then(|a| a.data["srs_stage"].as_i64())
}

#[tokio::test]
async fn test_lesson_starts_assignment() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();
    let client = server.client();
    let progress = lesson(106);

    client.send_progress(&progress).await.unwrap();

    let requests = server.requests_to("/v2/assignments/106/start");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "PUT");
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["started_at"], date::format(&progress.created_at));
    assert_eq!(stage_of(&server, 106), Some(1));

    // The change shows up in the next incremental fetch
    let levels = std::collections::HashMap::from([(6_i64, 2_i32)]);
    let changed = client
        .assignments(&FetchProgress::new(), Some(TestDataFactory::at(1)), &levels)
        .await
        .unwrap();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed.items[0].srs_stage, Some(SrsStage::Apprentice1));
    assert!(changed.items[0].started_at.is_some());
    assert_eq!(changed.items[0].level, 2);
}

#[tokio::test]
async fn test_starting_twice_is_rejected() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();
    let client = server.client();

    client.send_progress(&lesson(106)).await.unwrap();
    let err = client.send_progress(&lesson(106)).await.unwrap_err();

    match err {
        ApiError::Api { status, code, message, .. } => {
            assert_eq!(status, 422);
            assert_eq!(code, 422);
            assert_eq!(message.as_deref(), Some("Assignment has already been started"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_fresh_review_is_not_backdated() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();

    server.client().send_progress(&review(103, 0, 0)).await.unwrap();

    let requests = server.requests_to("/v2/reviews");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    let body = &requests[0].body.as_ref().unwrap()["review"];
    assert_eq!(body["assignment_id"], 103);
    assert_eq!(body["incorrect_meaning_answers"], 0);
    assert!(body.get("created_at").is_none());

    assert_eq!(stage_of(&server, 103), Some(5));
    assert_eq!(server.snapshot().reviews.len(), 1);
}

#[tokio::test]
async fn test_old_review_is_backdated() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();
    let mut progress = review(104, 1, 2);
    progress.created_at = Utc::now() - Duration::hours(1);

    server.client().send_progress(&progress).await.unwrap();

    let requests = server.requests_to("/v2/reviews");
    let body = &requests[0].body.as_ref().unwrap()["review"];
    assert_eq!(body["created_at"], date::format(&progress.created_at));
    assert_eq!(body["incorrect_meaning_answers"], 1);
    assert_eq!(body["incorrect_reading_answers"], 2);

    // Mistakes drop the item a stage
    assert_eq!(stage_of(&server, 104), Some(1));
    let snapshot = server.snapshot();
    assert_eq!(snapshot.reviews[0].data["created_at"], body["created_at"]);
}

#[tokio::test]
async fn test_review_for_unknown_assignment() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();

    let err = server
        .client()
        .send_progress(&review(999, 0, 0))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(server.snapshot().reviews.is_empty());
}

#[tokio::test]
async fn test_update_existing_study_material() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();
    let client = server.client();

    let mut material = client.study_material(3).await.unwrap().unwrap();
    assert_eq!(material.id, 201);
    assert_eq!(material.meaning_synonyms, vec!["single".to_string()]);

    material.meaning_note = Some("Horizontal line".to_string());
    material.meaning_synonyms.push("uno".to_string());
    let saved = client.update_study_material(&material).await.unwrap();

    assert_eq!(saved.id, 201);
    assert_eq!(saved.meaning_note.as_deref(), Some("Horizontal line"));
    assert_eq!(saved.meaning_synonyms, vec!["single".to_string(), "uno".to_string()]);

    let put = server.requests_to("/v2/study_materials/201");
    assert_eq!(put.len(), 1);
    assert_eq!(put[0].method, "PUT");
    let body = &put[0].body.as_ref().unwrap()["study_material"];
    assert!(body.get("subject_id").is_none());
}

#[tokio::test]
async fn test_create_study_material() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();
    let client = server.client();
    assert_eq!(client.study_material(4).await.unwrap(), None);

    let material = StudyMaterial {
        id: 0,
        subject_id: 4,
        meaning_note: None,
        reading_note: Some("Ni as in knee".to_string()),
        meaning_synonyms: vec!["deux".to_string()],
    };
    let saved = client.update_study_material(&material).await.unwrap();

    assert_eq!(saved.id, 202);
    assert_eq!(saved.subject_id, 4);
    assert_eq!(saved.reading_note.as_deref(), Some("Ni as in knee"));

    let posts: Vec<_> = server
        .requests_to("/v2/study_materials")
        .into_iter()
        .filter(|r| r.method == "POST")
        .collect();
    assert_eq!(posts.len(), 1);
    let body = &posts[0].body.as_ref().unwrap()["study_material"];
    assert_eq!(body["subject_id"], 4);
    assert_eq!(body["meaning_synonyms"], Value::from(vec!["deux"]));

    assert_eq!(client.study_material(4).await.unwrap(), Some(saved));
}
