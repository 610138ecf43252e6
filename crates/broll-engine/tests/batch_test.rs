//! Batch orchestration behavior against the programmable mock gateway.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use broll_engine::{BatchReport, Director, EngineError};
use broll_models::{AspectRatio, GenerationMode, ImageStyle, Scene, SceneStatus};

use support::{seeds, test_config, MockGateway};

fn style() -> &'static ImageStyle {
    ImageStyle::default_style()
}

#[tokio::test]
async fn test_script_scenario_all_scenes_complete() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.image_batch_size = 2;

    let mock = Arc::new(MockGateway::new().with_seeds(seeds(&["A.", "B.", "C."])));
    let director = Director::new(mock.clone(), config).unwrap();

    director.analyze_script("A. B. C.").await.unwrap();
    let scenes = director.scenes().await;
    let texts: Vec<_> = scenes.iter().map(|s| s.original_text.as_str()).collect();
    assert_eq!(texts, ["A.", "B.", "C."]);
    assert!(scenes.iter().all(|s| s.status == SceneStatus::Pending));

    // Three eligible scenes, chunked as 2 + 1.
    let report = director
        .run_batch(GenerationMode::Image, style(), AspectRatio::Landscape)
        .await
        .unwrap();
    assert_eq!(
        report,
        BatchReport {
            dispatched: 3,
            completed: 3,
            failed: 0
        }
    );

    for scene in director.scenes().await {
        assert_eq!(scene.status, SceneStatus::Completed);
        assert!(scene.image_url.is_some());
        assert!(scene.video_url.is_none());
        assert!(scene.is_consistent());
    }
    assert_eq!(mock.image_calls.load(Ordering::SeqCst), 3);
    assert!(mock.peak_image_concurrency() <= 2);
}

#[tokio::test]
async fn test_batch_isolation_only_failing_scenes_error() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockGateway::new());
    let director = Director::new(mock.clone(), test_config(dir.path())).unwrap();

    let untouched = Scene::new("done already", "{}").complete_with_image("img-old");
    let untouched_id = untouched.id.clone();
    director.store().write().await.replace_all(vec![
        Scene::new("good one", r#"{"scene":"one"}"#),
        Scene::new("bad one", "FAIL_IMAGE"),
        Scene::new("good two", r#"{"scene":"two"}"#),
        untouched,
    ]);

    let report = director
        .run_batch(GenerationMode::Image, style(), AspectRatio::Square)
        .await
        .unwrap();
    assert_eq!(report.dispatched, 3);
    assert_eq!(report.completed, 2);
    assert_eq!(report.failed, 1);

    let scenes = director.scenes().await;
    assert_eq!(scenes[0].status, SceneStatus::Completed);
    assert_eq!(scenes[1].status, SceneStatus::Error);
    assert_eq!(scenes[1].error.as_deref(), Some("Failed to generate image"));
    assert!(scenes[1].image_url.is_none());
    assert_eq!(scenes[2].status, SceneStatus::Completed);
    assert!(scenes.iter().all(|s| s.is_consistent()));

    // The ineligible scene was never touched.
    let untouched = scenes.iter().find(|s| s.id == untouched_id).unwrap();
    assert_eq!(untouched.image_url.as_deref(), Some("img-old"));
    assert_eq!(mock.image_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_reentry_with_scenes_in_flight_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockGateway::new());
    let director = Director::new(mock.clone(), test_config(dir.path())).unwrap();

    director.store().write().await.replace_all(vec![
        Scene::new("A.", "{}"),
        Scene::new("B.", "{}"),
    ]);

    // Everything already marked in flight, as after a prior call's marking
    // phase: the batch finds nothing eligible and dispatches nothing.
    {
        let mut store = director.store().write().await;
        let ids: Vec<_> = store.scenes().iter().map(|s| s.id.clone()).collect();
        store.mark_generating(&ids, GenerationMode::Image);
    }

    let report = director
        .run_batch(GenerationMode::Image, style(), AspectRatio::Landscape)
        .await
        .unwrap();
    assert_eq!(report, BatchReport::default());
    assert_eq!(mock.image_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_second_sequential_batch_dispatches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockGateway::new());
    let director = Director::new(mock.clone(), test_config(dir.path())).unwrap();

    director
        .store()
        .write()
        .await
        .replace_all(vec![Scene::new("A.", "{}"), Scene::new("B.", "{}")]);

    let first = director
        .run_batch(GenerationMode::Image, style(), AspectRatio::Landscape)
        .await
        .unwrap();
    assert_eq!(first.dispatched, 2);

    let second = director
        .run_batch(GenerationMode::Image, style(), AspectRatio::Landscape)
        .await
        .unwrap();
    assert_eq!(second.dispatched, 0);
    assert_eq!(mock.image_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_video_concurrency_stays_within_chunk_size() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockGateway::new().with_polls_until_done(2));
    let director = Director::new(mock.clone(), test_config(dir.path())).unwrap();

    director.store().write().await.replace_all(
        (0..5)
            .map(|i| Scene::new(format!("scene {i}"), format!(r#"{{"scene":"s{i}"}}"#)))
            .collect(),
    );

    let report = director
        .run_batch(GenerationMode::Video, style(), AspectRatio::Portrait)
        .await
        .unwrap();
    assert_eq!(report.dispatched, 5);
    assert_eq!(report.completed, 5);

    assert_eq!(mock.video_submits.load(Ordering::SeqCst), 5);
    // Two scenes per video chunk; never more in flight at once.
    assert!(mock.peak_video_concurrency() <= 2);

    for scene in director.scenes().await {
        assert_eq!(scene.status, SceneStatus::Completed);
        let path = scene.video_url.expect("video path");
        assert!(path.ends_with(".mp4"));
        assert!(std::fs::metadata(&path).is_ok(), "asset written to {path}");
    }
}

#[tokio::test]
async fn test_video_failure_stages_are_classified() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockGateway::new());
    let director = Director::new(mock.clone(), test_config(dir.path())).unwrap();

    director.store().write().await.replace_all(vec![
        Scene::new("fine", r#"{"scene":"fine"}"#),
        Scene::new("job errors", "JOB_ERROR"),
        Scene::new("filtered", "FILTERED"),
        Scene::new("submit dies", "FAIL_SUBMIT"),
        Scene::new("fetch dies", "FAIL_FETCH"),
    ]);

    let report = director
        .run_batch(GenerationMode::Video, style(), AspectRatio::Landscape)
        .await
        .unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 4);

    let scenes = director.scenes().await;
    assert_eq!(scenes[0].status, SceneStatus::Completed);

    // Job-reported and safety-filter failures keep their specific message.
    assert!(scenes[1].error.as_deref().unwrap().contains("quota exhausted"));
    assert!(scenes[2]
        .error
        .as_deref()
        .unwrap()
        .contains("safety guidelines"));

    // Transport-class failures collapse to the generic message.
    assert_eq!(scenes[3].error.as_deref(), Some("Failed to generate video"));
    assert_eq!(scenes[4].error.as_deref(), Some("Failed to generate video"));

    assert!(scenes.iter().all(|s| s.is_consistent()));
}

#[tokio::test]
async fn test_batches_are_mutually_exclusive_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.poll_interval = std::time::Duration::from_millis(20);

    let mock = Arc::new(MockGateway::new().with_polls_until_done(3));
    let director = Arc::new(Director::new(mock.clone(), config).unwrap());

    director
        .store()
        .write()
        .await
        .replace_all(vec![Scene::new("A.", "{}"), Scene::new("B.", "{}")]);

    let runner = Arc::clone(&director);
    let video_batch = tokio::spawn(async move {
        runner
            .run_batch(GenerationMode::Video, style(), AspectRatio::Portrait)
            .await
    });

    // Give the video batch time to take the lock.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let err = director
        .run_batch(GenerationMode::Image, style(), AspectRatio::Landscape)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Busy(GenerationMode::Video)));

    // Single video generations respect the same gate.
    let id = director.scenes().await[0].id.clone();
    let single = director
        .generate_one(&id, GenerationMode::Video, style(), AspectRatio::Portrait)
        .await
        .unwrap_err();
    assert!(matches!(single, EngineError::Busy(GenerationMode::Video)));

    video_batch.await.unwrap().unwrap();

    // The gate is released once the batch settles.
    let report = director
        .run_batch(GenerationMode::Image, style(), AspectRatio::Landscape)
        .await
        .unwrap();
    assert_eq!(report.dispatched, 2);
}

#[tokio::test]
async fn test_single_image_generation_bypasses_the_gate() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.poll_interval = std::time::Duration::from_millis(20);

    let mock = Arc::new(MockGateway::new().with_polls_until_done(3));
    let director = Arc::new(Director::new(mock.clone(), config).unwrap());

    // Already has a clip, so the video batch leaves it alone.
    let completed = Scene::new("already has a clip", "{}").complete_with_video("clip-old");
    let completed_id = completed.id.clone();
    director
        .store()
        .write()
        .await
        .replace_all(vec![Scene::new("A.", "{}"), completed]);

    let runner = Arc::clone(&director);
    let video_batch = tokio::spawn(async move {
        runner
            .run_batch(GenerationMode::Video, style(), AspectRatio::Portrait)
            .await
    });
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    // Re-generating a still for a scene outside the batch is permitted.
    director
        .generate_one(&completed_id, GenerationMode::Image, style(), AspectRatio::Square)
        .await
        .unwrap();

    let scene = director
        .scenes()
        .await
        .into_iter()
        .find(|s| s.id == completed_id)
        .unwrap();
    assert_eq!(scene.status, SceneStatus::Completed);
    assert!(scene.image_url.is_some());
    // Media exclusivity: the new still displaced the old clip.
    assert!(scene.video_url.is_none());

    video_batch.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_generate_one_refuses_in_flight_scene() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockGateway::new());
    let director = Director::new(mock.clone(), test_config(dir.path())).unwrap();

    director
        .store()
        .write()
        .await
        .replace_all(vec![Scene::new("A.", "{}")]);
    let id = director.scenes().await[0].id.clone();
    director
        .store()
        .write()
        .await
        .mark_generating(std::slice::from_ref(&id), GenerationMode::Image);

    let err = director
        .generate_one(&id, GenerationMode::Image, style(), AspectRatio::Square)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SceneInFlight(_)));
    assert_eq!(mock.image_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_video_credentials_checked_once_per_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockGateway::new().with_polls_until_done(2));
    let director = Director::new(mock.clone(), test_config(dir.path())).unwrap();

    director.store().write().await.replace_all(
        (0..5)
            .map(|i| Scene::new(format!("scene {i}"), "{}"))
            .collect(),
    );

    director
        .run_batch(GenerationMode::Video, style(), AspectRatio::Portrait)
        .await
        .unwrap();

    // Once per batch, not per scene and not per poll.
    assert_eq!(mock.credential_checks.load(Ordering::SeqCst), 1);
    assert!(mock.total_polls.load(Ordering::SeqCst) >= 10);
}

#[tokio::test]
async fn test_denied_credentials_abort_before_any_state_change() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockGateway::new().denying_credentials());
    let director = Director::new(mock.clone(), test_config(dir.path())).unwrap();

    director
        .store()
        .write()
        .await
        .replace_all(vec![Scene::new("A.", "{}")]);

    let err = director
        .run_batch(GenerationMode::Video, style(), AspectRatio::Portrait)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Gateway(_)));

    let scenes = director.scenes().await;
    assert_eq!(scenes[0].status, SceneStatus::Pending);
    assert_eq!(mock.video_submits.load(Ordering::SeqCst), 0);

    // The failed attempt released the batch lock.
    let report = director
        .run_batch(GenerationMode::Image, style(), AspectRatio::Square)
        .await
        .unwrap();
    assert_eq!(report.dispatched, 1);
}
