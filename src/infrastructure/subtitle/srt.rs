//! Subtitle codec — parse/emit the timed-text format, emit lyric format,
//! and append the credit line.
//!
//! Timestamp parsing/formatting follows a plain split-on-`:` idiom,
//! bit-exact on emission (`HH:MM:SS,mmm`, floor-to-millisecond rounding).

use chrono::Local;

use crate::domain::value_objects::SubtitleSegment;
use crate::shared::error::SubtitleError;

fn format_timestamp(total_seconds: f64) -> String {
    let floored_ms = (total_seconds * 1000.0).floor().max(0.0) as u64;
    let hours = floored_ms / 3_600_000;
    let minutes = (floored_ms % 3_600_000) / 60_000;
    let seconds = (floored_ms % 60_000) / 1000;
    let millis = floored_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

fn parse_timestamp(ts: &str) -> Result<f64, SubtitleError> {
    let parts: Vec<&str> = ts.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(SubtitleError::ParseError(format!("malformed timestamp: '{ts}'")));
    }
    let hours: f64 = parts[0]
        .parse()
        .map_err(|_| SubtitleError::ParseError(format!("bad hours in '{ts}'")))?;
    let minutes: f64 = parts[1]
        .parse()
        .map_err(|_| SubtitleError::ParseError(format!("bad minutes in '{ts}'")))?;

    let sec_parts: Vec<&str> = parts[2].splitn(2, ',').collect();
    let seconds: f64 = sec_parts[0]
        .parse()
        .map_err(|_| SubtitleError::ParseError(format!("bad seconds in '{ts}'")))?;
    let millis: f64 = match sec_parts.get(1) {
        Some(m) => m
            .parse()
            .map_err(|_| SubtitleError::ParseError(format!("bad milliseconds in '{ts}'")))?,
        None => 0.0,
    };

    Ok(hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0)
}

/// Parses a timed-text block list into segments. Confidence is not part
/// of the on-disk format, so round-tripped segments carry `1.0`.
pub fn parse(content: &str) -> Result<Vec<SubtitleSegment>, SubtitleError> {
    let mut segments = Vec::new();
    let normalized = content.replace("\r\n", "\n");
    let blocks = normalized.split("\n\n").filter(|b| !b.trim().is_empty());

    for block in blocks {
        let mut lines = block.lines();
        let _index_line = lines.next();
        let timing_line = lines
            .next()
            .ok_or_else(|| SubtitleError::ParseError("block missing timing line".to_string()))?;

        let (start_str, end_str) = timing_line
            .split_once("-->")
            .ok_or_else(|| SubtitleError::ParseError(format!("malformed timing line: '{timing_line}'")))?;
        let start = parse_timestamp(start_str)?;
        let end = parse_timestamp(end_str)?;

        let text: String = lines.collect::<Vec<_>>().join("\n");
        segments.push(SubtitleSegment::new(start, end, text, 1.0)?);
    }

    Ok(segments)
}

/// Emits segments as a timed-text document. Indices are 1-based and
/// re-assigned on emit; input indices are never consulted.
pub fn emit(segments: &[SubtitleSegment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(seg.start_seconds),
            format_timestamp(seg.end_seconds),
            seg.text,
        ));
    }
    out
}

/// Appends a credit segment `offset` seconds after the last segment's
/// end, lasting `offset` seconds.
pub fn with_credit_line(mut segments: Vec<SubtitleSegment>, product_name: &str, offset_seconds: f64) -> Vec<SubtitleSegment> {
    let last_end = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);
    let start = last_end + offset_seconds;
    let end = start + offset_seconds;
    let timestamp = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let text = format!("Transcribed by {product_name} on {timestamp}");

    if let Ok(credit) = SubtitleSegment::new(start, end, text, 1.0) {
        segments.push(credit);
    }
    segments
}

/// Emits the lyric format: one `[MM:SS.cc]TEXT` line per segment.
/// `cc` is hundredths of a second, truncated (not rounded); embedded
/// newlines in `TEXT` collapse to single spaces.
pub fn emit_lyrics(segments: &[SubtitleSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        let total_centis = (seg.start_seconds * 100.0).floor().max(0.0) as u64;
        let minutes = total_centis / 6000;
        let seconds = (total_centis % 6000) / 100;
        let centis = total_centis % 100;
        let collapsed = seg.text.replace('\n', " ");
        out.push_str(&format!("[{minutes:02}:{seconds:02}.{centis:02}]{collapsed}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> SubtitleSegment {
        SubtitleSegment::new(start, end, text, 0.9).unwrap()
    }

    #[test]
    fn emit_formats_timestamps_bit_exact() {
        let segments = vec![seg(0.0, 2.0, "Hello, this is a test.")];
        let out = emit(&segments);
        assert_eq!(out, "1\n00:00:00,000 --> 00:00:02,000\nHello, this is a test.\n\n");
    }

    #[test]
    fn round_trip_preserves_segments_up_to_index() {
        let segments = vec![seg(0.0, 2.0, "first"), seg(2.5, 5.0, "second")];
        let emitted = emit(&segments);
        let parsed = parse(&emitted).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].start_seconds, 0.0);
        assert_eq!(parsed[1].text, "second");
    }

    #[test]
    fn parse_rejects_malformed_timing_line() {
        let bad = "1\nnot a timestamp\ntext\n";
        assert!(parse(bad).is_err());
    }

    #[test]
    fn indices_are_reassigned_on_emit_ignoring_input() {
        let segments = vec![seg(0.0, 1.0, "a"), seg(1.0, 2.0, "b")];
        let out = emit(&segments);
        assert!(out.starts_with("1\n"));
        assert!(out.contains("\n2\n"));
    }

    #[test]
    fn credit_line_starts_offset_after_last_segment() {
        let segments = vec![seg(0.0, 10.0, "only line")];
        let with_credit = with_credit_line(segments, "SubGen", 5.0);
        assert_eq!(with_credit.len(), 2);
        assert_eq!(with_credit[1].start_seconds, 15.0);
        assert_eq!(with_credit[1].end_seconds, 20.0);
        assert!(with_credit[1].text.starts_with("Transcribed by SubGen on "));
    }

    #[test]
    fn lyric_format_truncates_hundredths_and_collapses_newlines() {
        let segments = vec![seg(65.239, 70.0, "line one\nline two")];
        let out = emit_lyrics(&segments);
        assert_eq!(out, "[01:05.23]line one line two\n");
    }
}
