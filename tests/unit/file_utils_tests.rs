/*!
 * Tests for file and folder utilities
 */

use anyhow::Result;
use std::fs;

use dubsmith::errors::DubbingError;
use dubsmith::file_utils::FileManager;

use crate::common;

#[test]
fn test_validate_video_input_should_classify_problems() -> Result<()> {
    let dir = common::create_temp_dir()?;

    let missing = dir.path().join("missing.mp4");
    assert!(matches!(
        FileManager::validate_video_input(&missing, 500),
        Err(DubbingError::InputNotFound(_))
    ));

    let text = common::create_test_file(dir.path(), "notes.txt", "hello")?;
    assert!(matches!(
        FileManager::validate_video_input(&text, 500),
        Err(DubbingError::InvalidInput(_))
    ));

    let video = common::create_test_file(dir.path(), "clip.MKV", "frames")?;
    assert!(FileManager::validate_video_input(&video, 500).is_ok());
    Ok(())
}

#[test]
fn test_find_videos_should_recurse_and_sort() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let nested = dir.path().join("season1");
    fs::create_dir_all(&nested)?;
    common::create_test_file(&nested, "b.mp4", "x")?;
    common::create_test_file(dir.path(), "a.mov", "x")?;
    common::create_test_file(dir.path(), "readme.md", "x")?;

    let videos = FileManager::find_videos(dir.path())?;
    assert_eq!(videos.len(), 2);
    assert!(videos[0].ends_with("a.mov"));
    assert!(videos[1].ends_with("season1/b.mp4"));
    Ok(())
}

#[test]
fn test_output_path_should_not_overwrite() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let first = FileManager::output_path(dir.path(), true);
    fs::write(&first, "taken")?;
    let second = FileManager::output_path(dir.path(), true);

    assert_ne!(first, second);
    let name = second.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("dubbed_subtitled_"));
    Ok(())
}

#[test]
fn test_scratch_paths_should_be_unique() {
    let dir = std::env::temp_dir();
    let a = FileManager::scratch_path(&dir, "synthesized", "wav");
    let b = FileManager::scratch_path(&dir, "synthesized", "wav");
    assert_ne!(a, b);
    assert!(a.file_name().unwrap().to_string_lossy().starts_with("synthesized_"));
}

#[test]
fn test_remove_quietly_should_ignore_missing_files() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let file = common::create_test_file(dir.path(), "tmp.wav", "x")?;
    assert!(FileManager::remove_quietly(&file));
    assert!(!FileManager::remove_quietly(&file));
    Ok(())
}
