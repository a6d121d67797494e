/*!
 * Tests for subtitle formatting and parsing
 */

use anyhow::Result;
use dubsmith::app_config::SubtitleStyle;
use dubsmith::errors::SubtitleError;
use dubsmith::subtitle_processor::{self, SubtitleCollection, SubtitleEntry};

use crate::common;

/// Test timestamp formatting and parsing
#[test]
fn test_timestamp_should_format_and_parse() {
    assert_eq!(SubtitleEntry::format_timestamp(5025.678), "01:23:45,678");
    assert_eq!(SubtitleEntry::format_timestamp(0.0), "00:00:00,000");
    assert!((SubtitleEntry::parse_timestamp("01:23:45,678").unwrap() - 5025.678).abs() < 1e-9);
    assert!(matches!(
        SubtitleEntry::parse_timestamp("1:2:3"),
        Err(SubtitleError::InvalidTimestamp(_))
    ));
}

/// Format then parse keeps timing within a millisecond and text unchanged
#[test]
fn test_format_then_parse_should_preserve_entries() {
    let entries = vec![
        SubtitleEntry::new(1, 0.0, 3.3333, "مرحبا بالجميع."),
        SubtitleEntry::new(2, 3.3333, 6.6667, "أهلا بكم في البرنامج، نتمنى لكم وقتا ممتعا مع هذه الحلقة الطويلة جدا."),
        SubtitleEntry::new(3, 6.6667, 10.0, "اليوم نتحدث عن راست."),
    ];

    let srt = subtitle_processor::format_entries(&entries, 50);
    let parsed = subtitle_processor::parse(&srt).unwrap();

    assert_eq!(parsed.len(), entries.len());
    for (original, back) in entries.iter().zip(&parsed) {
        assert_eq!(original.index, back.index);
        assert!((original.start - back.start).abs() <= 0.001);
        assert!((original.end - back.end).abs() <= 0.001);
        assert_eq!(original.text, back.text);
    }
}

/// Long captions are wrapped to the line width
#[test]
fn test_format_should_wrap_long_lines() {
    let text = "one two three four five six seven eight nine ten eleven twelve";
    let srt = subtitle_processor::format_entries(&[SubtitleEntry::new(1, 0.0, 1.0, text)], 20);
    let caption_lines: Vec<&str> = srt.lines().skip(2).take_while(|l| !l.is_empty()).collect();
    assert!(caption_lines.len() > 1);
    assert!(caption_lines.iter().all(|l| l.chars().count() <= 20));
}

/// Parsing a file written on disk
#[test]
fn test_read_srt_should_load_file() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(dir.path(), "sample.srt")?;
    let collection = SubtitleCollection::read_srt(&path)?;
    assert_eq!(collection.entries.len(), 3);
    assert_eq!(collection.entries[2].text, "For testing purposes.");
    assert!((collection.entries[1].start - 5.0).abs() < 1e-9);
    Ok(())
}

/// Malformed blocks are skipped, an input with none left is an error
#[test]
fn test_parse_should_skip_malformed_blocks() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nGood\n\n2\nnot a timestamp\nBad\n";
    let entries = subtitle_processor::parse(content).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(matches!(subtitle_processor::parse("garbage"), Err(SubtitleError::Empty)));
}

/// ASS output carries the style header and one dialogue line per entry
#[test]
fn test_to_ass_should_include_style_and_dialogue() {
    let collection = SubtitleCollection::new(vec![
        SubtitleEntry::new(1, 0.0, 1.5, "first"),
        SubtitleEntry::new(2, 1.5, 3.0, "second"),
    ]);
    let style = SubtitleStyle::default();
    let ass = collection.to_ass_string(&style);
    assert!(ass.contains("[V4+ Styles]"));
    assert!(ass.contains(&style.font_name));
    assert_eq!(ass.lines().filter(|l| l.starts_with("Dialogue:")).count(), 2);
    assert!(ass.contains("0:00:01.50"));
}
