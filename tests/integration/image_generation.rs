//! Image persistence: unique names, slugging and error surfacing

use super::test_utils::{client_for, offline};
use adcraft::error::{BackendError, PipelineError};
use adcraft::image::ImageGenerator;
use adcraft::provider::ScriptedBackend;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_concurrent_saves_never_collide() {
    let temp_dir = TempDir::new().unwrap();
    let (backend, client) = offline();
    let generator = Arc::new(ImageGenerator::new(client, temp_dir.path()));

    let saves = (0..12).map(|_| {
        let generator = generator.clone();
        async move { generator.generate("same prompt", Some("tiktok-1")).await }
    });
    let paths: Vec<_> = futures::future::join_all(saves)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let unique: HashSet<_> = paths.iter().collect();
    assert_eq!(unique.len(), 12);
    for path in &paths {
        assert!(path.is_file());
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("tiktok-1-"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "tiktok-1-".len() + 8 + ".png".len());
    }
    assert_eq!(backend.image_calls(), 12);
}

#[tokio::test]
async fn test_prompt_is_slugged_when_no_basename() {
    let temp_dir = TempDir::new().unwrap();
    let (_backend, client) = offline();
    let path = ImageGenerator::new(client, temp_dir.path())
        .with_slug_max_len(12)
        .generate("A Cold Bottle, on a Warm Trail!", None)
        .await
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("a-cold-bottl-"), "got {}", name);
}

#[tokio::test]
async fn test_safety_block_is_surfaced() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new().with_images(|_| {
        Err(BackendError::SafetyBlocked("prompt blocked".to_string()))
    }));
    let err = ImageGenerator::new(client_for(&backend), temp_dir.path())
        .generate("anything", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Backend(BackendError::SafetyBlocked(_))
    ));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}
