//! End-to-end pipeline runs against the offline backend

use super::test_utils::{brief, client_for, offline, EventLog};
use adcraft::model::{Platform, Stage};
use adcraft::pipeline::{PipelineEvent, PipelineOptions, PipelineOrchestrator};
use adcraft::provider::{scripted, ImageData, ScriptedBackend};
use adcraft::visual;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn options(platforms: Vec<Platform>, variations: usize) -> PipelineOptions {
    PipelineOptions {
        platforms,
        variations_per_platform: variations,
        run_id: Some("it-run".to_string()),
        ..PipelineOptions::default()
    }
}

#[tokio::test]
async fn test_offline_run_produces_every_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let (backend, client) = offline();
    let images_dir = temp_dir.path().join("generated");
    let ads_dir = temp_dir.path().join("ads");

    let mut run_options = options(vec![Platform::Facebook, Platform::Google], 2);
    run_options.max_concurrent_slots = 2;
    let state = PipelineOrchestrator::new(client, run_options)
        .with_output_dirs(&images_dir, &ads_dir)
        .run(brief())
        .await
        .unwrap();

    assert_eq!(state.run_id, "it-run");
    assert_eq!(state.slot_count(), 4);
    assert!(state.failures.is_empty(), "failures: {:?}", state.failures);
    assert_eq!(state.copy_count(), 4);
    assert_eq!(state.image_count(), 4);
    assert_eq!(state.creative_count(), 4);
    assert!(!state.strategies_used_fallback);

    let slots: Vec<String> = state.slots.iter().map(|s| s.to_string()).collect();
    assert_eq!(slots, vec!["Facebook #1", "Facebook #2", "Google #1", "Google #2"]);

    for image in state.generated_images.iter().flatten() {
        assert!(image.image_path.starts_with(&images_dir));
        assert!(image.image_path.is_file());
    }
    let composed: Vec<_> = state
        .composed_ads
        .iter()
        .flatten()
        .map(|c| c.composed_image_path.clone())
        .collect();
    assert_eq!(composed[0], ads_dir.join("it-run").join("facebook_ad_1.png"));
    assert_eq!(composed[3], ads_dir.join("it-run").join("google_ad_2.png"));
    assert!(composed.iter().all(|p| p.is_file()));

    for copy in state.generated_text.iter().flatten() {
        assert!(!copy.headline.is_empty() && !copy.body.is_empty(), "{:?}", copy);
    }
    assert_eq!(state.visual_prompts.len(), 4);
    for prompt in state.visual_prompts.iter().flatten() {
        let words = visual::word_count(prompt);
        assert!(visual::TARGET_WORDS.contains(&words), "got {} words", words);
        assert!(!prompt.contains("```"));
        assert!(!prompt.contains('\n'));
    }

    // one strategy call, one copy call per platform, one visual call per slot
    assert_eq!(backend.text_calls(), 1 + 2 + 4);
    assert_eq!(backend.image_calls(), 4);
    assert_eq!(backend.compose_calls(), 4);

    let recommendation = state.final_recommendation.unwrap();
    assert!(recommendation.contains("Strongest platform: Facebook (2/2 slots complete)"));
}

#[tokio::test]
async fn test_progress_events_are_ordered_and_monotonic() {
    let temp_dir = TempDir::new().unwrap();
    let (_backend, client) = offline();
    let log = Arc::new(EventLog::default());

    let mut run_options = options(Platform::core(), 2);
    run_options.max_concurrent_slots = 3;
    PipelineOrchestrator::new(client, run_options)
        .with_output_dirs(temp_dir.path().join("generated"), temp_dir.path().join("ads"))
        .with_observer(log.clone())
        .run(brief())
        .await
        .unwrap();

    let events = log.events();
    assert!(matches!(
        events.first(),
        Some(PipelineEvent::RunStarted { total_slots: 6, .. })
    ));
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::RunCompleted {
            succeeded: 6,
            failed: 0,
            ..
        })
    ));
    let completed: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            PipelineEvent::SlotCompleted { completed, .. } => Some(*completed),
            _ => None,
        })
        .collect();
    assert_eq!(completed, (1..=6).collect::<Vec<_>>());
    let copy_events = events
        .iter()
        .filter(|event| matches!(event, PipelineEvent::CopyGenerated { .. }))
        .count();
    assert_eq!(copy_events, 3);
}

#[tokio::test]
async fn test_compose_disabled_keeps_raw_images_only() {
    let temp_dir = TempDir::new().unwrap();
    let (backend, client) = offline();
    let ads_dir = temp_dir.path().join("ads");

    let mut run_options = options(vec![Platform::TikTok], 2);
    run_options.compose = false;
    let state = PipelineOrchestrator::new(client, run_options)
        .with_output_dirs(temp_dir.path().join("generated"), &ads_dir)
        .run(brief())
        .await
        .unwrap();

    assert_eq!(state.image_count(), 2);
    assert_eq!(state.creative_count(), 0);
    assert!(state.failures.is_empty());
    assert_eq!(backend.compose_calls(), 0);
    assert!(!ads_dir.exists());
}

#[tokio::test]
async fn test_missing_base_image_fails_only_composition() {
    let temp_dir = TempDir::new().unwrap();
    let (backend, client) = offline();

    let mut run_options = options(vec![Platform::Google], 2);
    run_options.base_image = Some(temp_dir.path().join("images/image.png"));
    let state = PipelineOrchestrator::new(client, run_options)
        .with_output_dirs(temp_dir.path().join("generated"), temp_dir.path().join("ads"))
        .run(brief())
        .await
        .unwrap();

    assert_eq!(state.failures.len(), 2);
    assert!(state.failures.iter().all(|f| f.stage == Stage::Compose));
    assert!(state.failures[0].message.contains("Base image not found"));
    assert_eq!(state.image_count(), 2);
    assert_eq!(state.creative_count(), 0);
    assert_eq!(backend.compose_calls(), 0);
    let recommendation = state.final_recommendation.unwrap();
    assert!(recommendation.contains("Failures (2):"));
}

#[tokio::test]
async fn test_image_panic_is_contained_to_its_slot() {
    let temp_dir = TempDir::new().unwrap();
    // Only the second visual prompt carries the trigger.
    let visual_calls = Arc::new(AtomicUsize::new(0));
    let counter = visual_calls.clone();
    let backend = Arc::new(
        ScriptedBackend::offline()
            .with_text(move |request| {
                let text = scripted::offline_text(request)?;
                if request.response_schema.is_none() && counter.fetch_add(1, Ordering::SeqCst) == 1 {
                    return Ok(format!("PANIC {}", text));
                }
                Ok(text)
            })
            .with_images(|request| {
                if request.prompt.contains("PANIC") {
                    panic!("renderer crashed");
                }
                Ok(vec![ImageData::png(scripted::PLACEHOLDER_PNG.to_vec())])
            }),
    );
    let client = client_for(&backend);

    let state = PipelineOrchestrator::new(client, options(vec![Platform::Facebook], 3))
        .with_output_dirs(temp_dir.path().join("generated"), temp_dir.path().join("ads"))
        .run(brief())
        .await
        .unwrap();

    assert_eq!(visual_calls.load(Ordering::SeqCst), 3);
    assert_eq!(state.slot_count(), 3);
    assert_eq!(state.failures.len(), 1);
    let failure = &state.failures[0];
    assert_eq!(failure.slot.variation, 1);
    assert_eq!(failure.stage, Stage::Image);
    assert!(failure.message.contains("panicked: renderer crashed"));
    assert!(state.visual_prompts[1].is_some());
    assert!(state.generated_images[1].is_none());
    assert!(state.composed_ads[0].is_some());
    assert!(state.composed_ads[2].is_some());
}
