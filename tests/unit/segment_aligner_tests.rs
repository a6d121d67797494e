/*!
 * Tests for caption alignment
 */

use dubsmith::segment_aligner::{self, OverflowPolicy, SegmentAligner, TimedSegment};

fn segments() -> Vec<TimedSegment> {
    vec![
        TimedSegment::new(0.0, 4.0, "a"),
        TimedSegment::new(4.0, 8.0, "b"),
        TimedSegment::new(8.0, 12.0, "c"),
    ]
}

#[test]
fn test_align_should_pair_sentences_with_segments() {
    let entries = segment_aligner::align("One. Two. Three.", &segments(), 12.0);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].text, "One.");
    assert!((entries[2].start - 8.0).abs() < 1e-9 && (entries[2].end - 12.0).abs() < 1e-9);
}

#[test]
fn test_align_with_fewer_sentences_should_reuse_last() {
    let entries = segment_aligner::align("Only one.", &segments(), 12.0);
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.text == "Only one."));
}

#[test]
fn test_align_with_extra_sentences_should_follow_policy() {
    let text = "One. Two. Three. Four. Five.";

    let dropped = SegmentAligner::new(OverflowPolicy::Drop).align(text, &segments(), 12.0);
    assert_eq!(dropped.len(), 3);

    let extended = SegmentAligner::new(OverflowPolicy::ExtendLast).align(text, &segments(), 12.0);
    assert_eq!(extended.len(), 5);
    assert!(extended.iter().all(|e| e.end <= 12.0 + 1e-9));
    // last segment 8..12 shared by three captions
    assert!((extended[2].end - (8.0 + 4.0 / 3.0)).abs() < 1e-9);
    assert!((extended[4].end - 12.0).abs() < 1e-9);
    assert!(extended.windows(2).all(|w| w[0].start <= w[1].start));
}

#[test]
fn test_align_should_keep_captions_monotonic_for_unordered_segments() {
    let mut shuffled = segments();
    shuffled.reverse();
    let entries = segment_aligner::align("One. Two. Three.", &shuffled, 12.0);
    assert!(entries.windows(2).all(|w| w[0].start <= w[1].start));
    assert!(entries.iter().enumerate().all(|(i, e)| e.index == i + 1));
}

#[test]
fn test_align_uniform_should_fill_duration() {
    let entries = segment_aligner::align_uniform("One. Two. Three. Four.", 10.0);
    assert_eq!(entries.len(), 4);
    assert!((entries[0].end - 2.5).abs() < 1e-9);
    assert!((entries[3].end - 10.0).abs() < 1e-9);
}

#[test]
fn test_align_empty_text_should_give_no_entries() {
    assert!(segment_aligner::align("  ", &segments(), 12.0).is_empty());
    assert!(segment_aligner::align_uniform("", 12.0).is_empty());
}

#[test]
fn test_align_two_arabic_sentences_should_keep_segment_bounds() {
    let segments = vec![
        TimedSegment::new(0.0, 5.0, "Hello world."),
        TimedSegment::new(5.0, 12.0, "How are you?"),
    ];
    let entries = segment_aligner::align("مرحبا بالعالم. كيف حالك؟", &segments, 12.0);

    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].start, entries[0].end), (0.0, 5.0));
    assert_eq!((entries[1].start, entries[1].end), (5.0, 12.0));
    assert_eq!(entries[0].text, "مرحبا بالعالم.");
    assert_eq!(entries[1].text, "كيف حالك؟");
}

#[test]
fn test_align_more_segments_than_sentences_should_repeat_last_sentence() {
    let entries = segment_aligner::align("A. B.", &segments(), 12.0);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].text, entries[1].text);
    assert_eq!(entries[2].text, "B.");
}

#[test]
fn test_align_without_segments_should_split_duration_evenly() {
    let entries = segment_aligner::align("A. B. C.", &[], 30.0);
    let bounds: Vec<(f64, f64)> = entries.iter().map(|e| (e.start, e.end)).collect();
    assert_eq!(bounds, vec![(0.0, 10.0), (10.0, 20.0), (20.0, 30.0)]);
}
