/*!
 * End-to-end tests of the dubbing pipeline against mock collaborators
 */

use anyhow::Result;
use std::time::Duration;

use dubsmith::app_controller::{PipelineStage, VoiceSelection};
use dubsmith::errors::DubbingError;
use dubsmith::media::mock::{MediaCall, MockMediaTool};
use dubsmith::media::BurnVariant;
use dubsmith::providers::mock::{MockBehavior, MockRecognizer, MockSynthesizer, MockTranslator};
use dubsmith::providers::Transcription;
use dubsmith::segment_aligner::TimedSegment;

use crate::common::{self, english_transcription, ProgressLog, TestEnv};

#[tokio::test]
async fn test_dub_twelve_second_video_should_produce_subtitled_output() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working().with_duration(12.0);
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let mut progress = ProgressLog::default();
    let outcome = controller.dub(&env.job(), |u| progress.updates.push(u)).await?;

    assert!(outcome.output_path.exists());
    let file_name = outcome.output_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("dubbed_subtitled_"), "{}", file_name);
    assert!(file_name.ends_with(".mp4"));
    assert_eq!(outcome.output_path.parent(), Some(env.output_dir().as_path()));

    assert_eq!(outcome.translated_text, "مرحبا بالجميع. أهلا بكم في البرنامج. اليوم نتحدث عن راست.");
    assert_eq!(outcome.succeeded_chunks, 3);
    assert_eq!(outcome.failed_chunks, 0);
    assert_eq!(outcome.burn_variant, Some(BurnVariant::Styled));

    assert_eq!(outcome.subtitles.len(), 3);
    for (i, entry) in outcome.subtitles.iter().enumerate() {
        assert_eq!(entry.index, i + 1);
        assert!(entry.start >= 0.0 && entry.end >= entry.start && entry.end <= 12.0);
    }
    assert!(outcome.subtitles.windows(2).all(|w| w[0].start <= w[1].start));
    assert_eq!(outcome.subtitles[1].text, "أهلا بكم في البرنامج.");

    assert_eq!(
        outcome.stages,
        vec![
            PipelineStage::Init,
            PipelineStage::AudioExtracted,
            PipelineStage::Transcribed,
            PipelineStage::Translated,
            PipelineStage::Synthesized,
            PipelineStage::Merged,
            PipelineStage::SubtitlesBurned,
            PipelineStage::Done,
        ]
    );

    let percents = progress.percents();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    assert_eq!(percents.last(), Some(&100));

    assert!(common::files_in(&env.scratch_dir()).is_empty());
    assert_eq!(common::files_in(&env.output_dir()), vec![outcome.output_path.clone()]);
    Ok(())
}

#[tokio::test]
async fn test_dub_without_subtitles_should_skip_burn() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working();
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let mut job = env.job();
    job.add_subtitles = false;
    let outcome = controller.dub(&job, |_| {}).await?;

    let file_name = outcome.output_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("dubbed_") && !file_name.contains("subtitled"));
    assert!(outcome.subtitles.is_empty());
    assert_eq!(outcome.burn_variant, None);
    assert!(!outcome.stages.contains(&PipelineStage::SubtitlesBurned));
    assert!(!media.calls().iter().any(|c| matches!(c, MediaCall::Burn { .. })));
    assert!(common::files_in(&env.scratch_dir()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_styled_burn_failure_should_retry_plain() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working().failing_burns(1);
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let mut progress = ProgressLog::default();
    let outcome = controller.dub(&env.job(), |u| progress.updates.push(u)).await?;

    assert_eq!(outcome.burn_variant, Some(BurnVariant::Plain));
    assert!(outcome.output_path.exists());

    let burns: Vec<_> = media
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            MediaCall::Burn { variant, subtitles, .. } => Some((variant, subtitles)),
            _ => None,
        })
        .collect();
    assert_eq!(burns.len(), 2);
    assert_eq!(burns[0].0, BurnVariant::Styled);
    assert_eq!(burns[0].1.extension().unwrap(), "ass");
    assert_eq!(burns[1].0, BurnVariant::Plain);
    assert_eq!(burns[1].1.extension().unwrap(), "srt");

    assert!(progress.messages().iter().any(|m| m.contains("without styling")));
    assert!(common::files_in(&env.scratch_dir()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_both_burns_failing_should_report_both_errors() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working().failing_burns(2);
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let mut progress = ProgressLog::default();
    let err = controller.dub(&env.job(), |u| progress.updates.push(u)).await.unwrap_err();

    match err {
        DubbingError::SubtitleBurnFailure(message) => {
            assert!(message.contains("styled"), "{}", message);
            assert!(message.contains("plain"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(progress.percents().last(), Some(&0));
    assert!(common::files_in(&env.scratch_dir()).is_empty());
    assert!(common::files_in(&env.output_dir()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_merge_failure_should_clean_up() -> Result<()> {
    let env = TestEnv::new()?;
    let controller = env.controller(MockSynthesizer::working(), MockMediaTool::working().failing_merge());

    let err = controller.dub(&env.job(), |_| {}).await.unwrap_err();

    assert!(matches!(err, DubbingError::MergeFailure(_)));
    assert!(common::files_in(&env.scratch_dir()).is_empty());
    assert!(common::files_in(&env.output_dir()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_media_tool_should_fail_before_processing() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::unavailable();
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let err = controller.dub(&env.job(), |_| {}).await.unwrap_err();

    assert!(matches!(err, DubbingError::CollaboratorUnavailable(_)));
    assert!(media.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_input_should_fail_before_any_media_call() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working();
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let mut job = env.job();
    job.video_path = env.dir.path().join("nope.mp4");
    let err = controller.dub(&job, |_| {}).await.unwrap_err();

    assert!(matches!(err, DubbingError::InputNotFound(ref p) if p == &job.video_path));
    assert!(media.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_voice_reference_should_fail_before_processing() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working();
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let mut job = env.job();
    job.voice = VoiceSelection::Custom(env.dir.path().join("nobody.wav"));
    let err = controller.dub(&job, |_| {}).await.unwrap_err();

    assert!(matches!(err, DubbingError::InputNotFound(_)));
    assert!(media.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_partial_synthesis_failure_should_warn_and_continue() -> Result<()> {
    let env = TestEnv::new()?;
    let controller = env.controller(MockSynthesizer::intermittent(2), MockMediaTool::working());

    let mut progress = ProgressLog::default();
    let outcome = controller.dub(&env.job(), |u| progress.updates.push(u)).await?;

    assert_eq!(outcome.succeeded_chunks, 2);
    assert_eq!(outcome.failed_chunks, 1);
    assert!(progress.messages().iter().any(|m| m.contains("1 of 3 chunks failed")));
    assert!(outcome.output_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_all_chunks_failing_should_report_empty_output() -> Result<()> {
    let env = TestEnv::new()?;
    let controller = env.controller(MockSynthesizer::failing(), MockMediaTool::working());

    let err = controller.dub(&env.job(), |_| {}).await.unwrap_err();

    assert!(matches!(err, DubbingError::EmptyOutput { attempted: 3 }));
    assert!(common::files_in(&env.scratch_dir()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_recognizer_failure_should_name_the_stage() -> Result<()> {
    let env = TestEnv::new()?;
    let controller = env.controller_with(
        MockRecognizer::failing(),
        common::arabic_translator(),
        MockSynthesizer::working(),
        MockMediaTool::working(),
    );

    let err = controller.dub(&env.job(), |_| {}).await.unwrap_err();

    assert!(matches!(err, DubbingError::Stage { stage: "Transcription", .. }));
    assert!(common::files_in(&env.scratch_dir()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_translator_failure_should_name_the_stage() -> Result<()> {
    let env = TestEnv::new()?;
    let controller = env.controller_with(
        MockRecognizer::new(english_transcription()),
        MockTranslator::failing(),
        MockSynthesizer::working(),
        MockMediaTool::working(),
    );

    let err = controller.dub(&env.job(), |_| {}).await.unwrap_err();
    assert!(matches!(err, DubbingError::Stage { stage: "Translation", .. }));
    Ok(())
}

#[tokio::test]
async fn test_untimed_transcript_should_spread_captions_over_probed_duration() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working().with_duration(9.0);
    let transcription = Transcription {
        segments: Vec::new(),
        ..english_transcription()
    };
    let controller = env.controller_with(
        MockRecognizer::new(transcription),
        common::arabic_translator(),
        MockSynthesizer::working(),
        media.clone(),
    );

    let outcome = controller.dub(&env.job(), |_| {}).await?;

    assert!(media.calls().contains(&MediaCall::Probe));
    assert_eq!(outcome.subtitles.len(), 3);
    assert!((outcome.subtitles[0].end - 3.0).abs() < 1e-9);
    assert!((outcome.subtitles[2].end - 9.0).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_same_language_should_not_call_translator() -> Result<()> {
    let mut env = TestEnv::new()?;
    env.config.target_language = "en".to_string();
    let translator = MockTranslator::failing();
    let controller = env.controller_with(
        MockRecognizer::new(english_transcription()),
        translator.clone(),
        MockSynthesizer::working(),
        MockMediaTool::working(),
    );

    let outcome = controller.dub(&env.job(), |_| {}).await?;

    assert_eq!(translator.request_count(), 0);
    assert_eq!(outcome.translated_text, common::ENGLISH_TRANSCRIPT);
    Ok(())
}

#[tokio::test]
async fn test_dialect_should_adapt_translation() -> Result<()> {
    let mut env = TestEnv::new()?;
    env.config.dialect = Some("egyptian".to_string());
    let transcription = Transcription {
        text: "How are you?".to_string(),
        segments: Vec::new(),
        language: None,
    };
    let controller = env.controller_with(
        MockRecognizer::new(transcription),
        MockTranslator::with_mapping(&[("How are you?", "كيف حالك؟")]),
        MockSynthesizer::working(),
        MockMediaTool::working(),
    );

    let outcome = controller.dub(&env.job(), |_| {}).await?;
    assert_eq!(outcome.translated_text, "إزيك؟");
    Ok(())
}

#[tokio::test]
async fn test_gulf_dialect_should_keep_why_and_greeting_intact() -> Result<()> {
    let mut env = TestEnv::new()?;
    env.config.dialect = Some("gulf".to_string());
    let transcription = Transcription {
        text: "Peace be upon you. Why are you late? What happened?".to_string(),
        segments: vec![
            TimedSegment::new(0.0, 2.0, "Peace be upon you."),
            TimedSegment::new(2.0, 4.0, "Why are you late?"),
            TimedSegment::new(4.0, 6.0, "What happened?"),
        ],
        language: Some("en".to_string()),
    };
    let controller = env.controller_with(
        MockRecognizer::new(transcription),
        MockTranslator::with_mapping(&[
            ("Peace be upon you.", "السلام عليكم."),
            ("Why are you late?", "لماذا تأخرت؟"),
            ("What happened?", "ماذا حدث؟"),
        ]),
        MockSynthesizer::working(),
        MockMediaTool::working(),
    );

    let outcome = controller.dub(&env.job(), |_| {}).await?;

    assert_eq!(outcome.translated_text, "السلام عليكم. ليش تأخرت؟ شنو حدث؟");
    let captions: Vec<&str> = outcome.subtitles.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(captions, vec!["السلام عليكم.", "ليش تأخرت؟", "شنو حدث؟"]);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_job_should_leave_no_scratch_files() -> Result<()> {
    let env = TestEnv::new()?;
    let controller = env.controller(
        MockSynthesizer::new(MockBehavior::Slow { delay_ms: 500 }),
        MockMediaTool::working(),
    );

    let job = env.job();
    let result = tokio::time::timeout(Duration::from_millis(100), controller.dub(&job, |_| {})).await;

    assert!(result.is_err(), "job should have been cancelled");
    assert!(common::files_in(&env.scratch_dir()).is_empty());
    assert!(common::files_in(&env.output_dir()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancel_during_burn_should_not_leave_partial_output() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working().with_burn_delay(5_000);
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let job = env.job();
    let result = tokio::time::timeout(Duration::from_millis(1_000), controller.dub(&job, |_| {})).await;

    assert!(result.is_err(), "job should have been cancelled");
    assert!(media.calls().iter().any(|c| matches!(c, MediaCall::Burn { .. })));
    assert!(common::files_in(&env.scratch_dir()).is_empty());
    assert!(common::files_in(&env.output_dir()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_media_writes_should_stay_in_scratch_until_done() -> Result<()> {
    let env = TestEnv::new()?;
    let media = MockMediaTool::working();
    let controller = env.controller(MockSynthesizer::working(), media.clone());

    let outcome = controller.dub(&env.job(), |_| {}).await?;

    for call in media.calls() {
        match call {
            MediaCall::Merge { output } | MediaCall::Burn { output, .. } => {
                assert_eq!(output.parent(), Some(env.scratch_dir().as_path()));
            }
            _ => {}
        }
    }
    assert_eq!(std::fs::read(&outcome.output_path)?, b"burned video");
    Ok(())
}

#[tokio::test]
async fn test_dub_should_run_on_a_spawned_task() -> Result<()> {
    let env = TestEnv::new()?;
    let controller = std::sync::Arc::new(env.controller(MockSynthesizer::working(), MockMediaTool::working()));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let controller = controller.clone();
            let job = env.job();
            tokio::spawn(async move { controller.dub(&job, |_| {}).await })
        })
        .collect();

    let mut outputs = Vec::new();
    for handle in handles {
        outputs.push(handle.await??.output_path);
    }
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|p| p.exists()));
    Ok(())
}

#[tokio::test]
async fn test_run_folder_should_dub_every_video() -> Result<()> {
    let env = TestEnv::new()?;
    let videos = env.dir.path().join("videos");
    std::fs::create_dir_all(&videos)?;
    common::create_test_file(&videos, "one.mp4", "frames")?;
    common::create_test_file(&videos, "two.mkv", "frames")?;
    common::create_test_file(&videos, "notes.txt", "not a video")?;

    let controller = env.controller(MockSynthesizer::working(), MockMediaTool::working());
    let summary = controller.run_folder(videos, VoiceSelection::Female).await?;

    assert_eq!(summary.outputs.len(), 2);
    assert!(summary.failures.is_empty());
    assert_ne!(summary.outputs[0], summary.outputs[1]);
    assert!(summary.outputs.iter().all(|p| p.exists()));
    Ok(())
}
