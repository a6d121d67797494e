/*!
 * Tests for error types
 */

use std::error::Error;
use std::path::PathBuf;

use dubsmith::errors::{AppError, DubbingError, ProviderError, SubtitleError};

#[test]
fn test_only_chunk_failures_should_be_non_fatal() {
    let chunk = DubbingError::ChunkSynthesisFailure {
        index: 3,
        reason: "timeout".to_string(),
    };
    assert!(!chunk.is_fatal());
    assert!(DubbingError::EmptyOutput { attempted: 4 }.is_fatal());
    assert!(DubbingError::MergeFailure("boom".to_string()).is_fatal());
}

#[test]
fn test_stage_error_should_keep_source() {
    let err = DubbingError::Stage {
        stage: "Translation",
        source: ProviderError::ConnectionError("refused".to_string()),
    };
    assert!(err.to_string().starts_with("Translation failed"));
    assert!(err.source().is_some());
}

#[test]
fn test_error_messages_should_name_the_problem() {
    let err = DubbingError::InputNotFound(PathBuf::from("/videos/talk.mp4"));
    assert!(err.to_string().contains("/videos/talk.mp4"));

    let err = DubbingError::EmptyOutput { attempted: 7 };
    assert!(err.to_string().contains('7'));
}

#[test]
fn test_app_error_should_wrap_lower_layers() {
    let app: AppError = DubbingError::SubtitleBurnFailure("x".to_string()).into();
    assert!(matches!(app, AppError::Dubbing(_)));

    let app: AppError = SubtitleError::Empty.into();
    assert!(matches!(app, AppError::Subtitle(_)));

    let app: AppError = anyhow::anyhow!("odd").into();
    assert!(matches!(app, AppError::Unknown(_)));
}
