use std::fmt;
use std::fs;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use log::{warn, debug};
use crate::app_config::SubtitleStyle;
use crate::errors::SubtitleError;

// @module: Subtitle formatting, parsing and style conversion

// @const: SRT timestamp line regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timestamp regex is valid")
});

/// Default caption line width in characters
pub const DEFAULT_LINE_WIDTH: usize = 50;

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: 1-based sequence number
    pub index: usize,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Caption text, one logical line
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        SubtitleEntry {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    // @creates: Validated subtitle entry
    // @validates: Ordered time range and non-empty text
    pub fn new_validated(index: usize, start: f64, end: f64, text: &str) -> Result<Self, SubtitleError> {
        if !(start >= 0.0 && end >= start) {
            return Err(SubtitleError::MalformedBlock {
                block: index,
                reason: format!("end time {:.3} precedes start time {:.3}", end, start),
            });
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(SubtitleError::MalformedBlock {
                block: index,
                reason: "empty caption text".to_string(),
            });
        }

        Ok(Self::new(index, start, end, trimmed_text))
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Format a time in seconds as an SRT timestamp (HH:MM:SS,mmm)
    pub fn format_timestamp(seconds: f64) -> String {
        let ms = seconds_to_ms(seconds);
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let secs = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) into seconds
    pub fn parse_timestamp(timestamp: &str) -> Result<f64, SubtitleError> {
        let invalid = || SubtitleError::InvalidTimestamp(timestamp.to_string());
        let parts: Vec<&str> = timestamp.trim().split([':', ',', '.']).collect();

        if parts.len() != 4 {
            return Err(invalid());
        }

        let hours: u64 = parts[0].parse().map_err(|_| invalid())?;
        let minutes: u64 = parts[1].parse().map_err(|_| invalid())?;
        let seconds: u64 = parts[2].parse().map_err(|_| invalid())?;
        let millis: u64 = parts[3].parse().map_err(|_| invalid())?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 || parts[3].len() != 3 {
            return Err(invalid());
        }

        let total_ms = hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis;
        Ok(total_ms as f64 / 1000.0)
    }

    /// Format a time in seconds as an ASS timestamp (H:MM:SS.cc).
    /// Milliseconds are truncated to centiseconds.
    pub fn format_ass_timestamp(seconds: f64) -> String {
        let ms = seconds_to_ms(seconds);
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let secs = (ms % 60_000) / 1_000;
        let centis = (ms % 1_000) / 10;

        format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
    }

    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start)
    }

    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Convert an SRT timestamp to the ASS convention (`HH:MM:SS,mmm` -> `H:MM:SS.cc`)
pub fn srt_to_ass_time(srt_time: &str) -> Result<String, SubtitleError> {
    let seconds = SubtitleEntry::parse_timestamp(srt_time)?;
    Ok(SubtitleEntry::format_ass_timestamp(seconds))
}

/// Wrap a caption so that no line exceeds `width` characters.
/// Breaks only at whitespace; a word longer than the width gets its own line.
pub fn wrap_text(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if !current.is_empty() && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

/// Render entries as SRT text, wrapping captions to `line_width`
pub fn format_entries(entries: &[SubtitleEntry], line_width: usize) -> String {
    let mut output = String::new();
    for entry in entries {
        let wrapped = SubtitleEntry {
            text: wrap_text(&entry.text, line_width),
            ..entry.clone()
        };
        output.push_str(&wrapped.to_string());
    }
    output
}

/// Parse SRT text into entries.
///
/// Caption lines of one block are joined with a single space, which makes
/// this the inverse of [`format_entries`]. Invalid blocks are skipped with a
/// warning; entries come back sorted by start time and renumbered from 1.
pub fn parse(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let mut entries = Vec::new();
    let mut block_number = 0;

    let normalized = content.replace("\r\n", "\n");
    let mut lines = normalized.lines().peekable();

    while lines.peek().is_some() {
        // Skip blank separators
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        let block: Vec<&str> = std::iter::from_fn(|| lines.next_if(|l| !l.trim().is_empty()))
            .collect();
        if block.is_empty() {
            continue;
        }
        block_number += 1;

        match parse_block(block_number, &block) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping subtitle block: {}", e),
        }
    }

    if entries.is_empty() {
        return Err(SubtitleError::Empty);
    }

    // Sort by start time to ensure correct order
    entries.sort_by(|a: &SubtitleEntry, b: &SubtitleEntry| a.start.total_cmp(&b.start));

    let overlap_count = entries.windows(2).filter(|w| w[0].end > w[1].start).count();
    if overlap_count > 0 {
        debug!("Found {} overlapping subtitle entries", overlap_count);
    }

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.index = i + 1;
    }

    Ok(entries)
}

fn parse_block(block_number: usize, block: &[&str]) -> Result<SubtitleEntry, SubtitleError> {
    let malformed = |reason: &str| SubtitleError::MalformedBlock {
        block: block_number,
        reason: reason.to_string(),
    };

    // The sequence number line is optional in the wild; the timing line is not
    let (index, timing_pos) = match block[0].trim().parse::<usize>() {
        Ok(n) => (n, 1),
        Err(_) => (block_number, 0),
    };

    let timing = block.get(timing_pos).ok_or_else(|| malformed("missing timing line"))?;
    let caps = TIMESTAMP_REGEX
        .captures(timing.trim())
        .ok_or_else(|| malformed("invalid timing line"))?;

    let start = captured_seconds(&caps, 1);
    let end = captured_seconds(&caps, 5);

    let text = block[timing_pos + 1..]
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join(" ");

    SubtitleEntry::new_validated(index, start, end, &text)
}

fn captured_seconds(caps: &regex::Captures, start_idx: usize) -> f64 {
    let field = |i: usize| -> u64 {
        caps.get(start_idx + i)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };
    let total_ms = (field(0) * 3600 + field(1) * 60 + field(2)) * 1000 + field(3);
    total_ms as f64 / 1000.0
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// An ordered set of captions for one video
#[derive(Debug, Clone, Default)]
pub struct SubtitleCollection {
    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,

    /// Maximum caption line width used when rendering
    pub line_width: usize,
}

impl SubtitleCollection {
    pub fn new(entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection {
            entries,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }

    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse SRT text into a collection
    pub fn parse_srt_string(content: &str) -> Result<Self, SubtitleError> {
        Ok(Self::new(parse(content)?))
    }

    /// Render as SRT
    pub fn to_srt_string(&self) -> String {
        format_entries(&self.entries, self.line_width)
    }

    /// Render as a style-annotated ASS script
    pub fn to_ass_string(&self, style: &SubtitleStyle) -> String {
        let mut output = ass_header(style);
        for entry in &self.entries {
            let text = wrap_text(&entry.text, self.line_width).replace('\n', "\\N");
            output.push_str(&format!(
                "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
                SubtitleEntry::format_ass_timestamp(entry.start),
                SubtitleEntry::format_ass_timestamp(entry.end),
                text
            ));
        }
        output
    }

    /// Write subtitles to an SRT file (UTF-8)
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        fs::write(path, self.to_srt_string())
    }

    /// Write subtitles to an ASS file (UTF-8)
    pub fn write_to_ass<P: AsRef<Path>>(&self, path: P, style: &SubtitleStyle) -> std::io::Result<()> {
        fs::write(path, self.to_ass_string(style))
    }

    /// Read an SRT file
    pub fn read_srt<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        Ok(Self::parse_srt_string(&content)?)
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        if let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) {
            writeln!(f, "Span: {} --> {}", first.format_start_time(), last.format_end_time())?;
        }
        Ok(())
    }
}

fn ass_header(style: &SubtitleStyle) -> String {
    format!(
        "[Script Info]\n\
         Title: Dubbed Subtitles\n\
         ScriptType: v4.00+\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\
         YCbCr Matrix: TV.709\n\
         PlayResX: 1920\n\
         PlayResY: 1080\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Default,{},{},{},&H000000FF,{},{},{},{},0,0,100,100,0,0,{},{},{},{},10,10,{},1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
        style.font_name,
        style.font_size,
        style.primary_colour,
        style.outline_colour,
        style.back_colour,
        if style.bold { -1 } else { 0 },
        if style.italic { -1 } else { 0 },
        style.border_style,
        style.outline,
        style.shadow,
        style.alignment,
        style.margin_v,
    )
}
