//! SubtitleSegment value object.

use crate::shared::error::SubtitleError;

/// A single timed subtitle cue. Immutable once constructed; construction
/// validates start/end ordering, non-empty text, and confidence range.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
    pub confidence: f32,
}

impl SubtitleSegment {
    /// Builds a segment, rejecting: negative start, non-positive duration,
    /// empty text after trim, and confidence outside `[0, 1]`.
    pub fn new(
        start_seconds: f64,
        end_seconds: f64,
        text: impl Into<String>,
        confidence: f32,
    ) -> Result<Self, SubtitleError> {
        let text = text.into();
        let trimmed = text.trim();

        if start_seconds < 0.0 {
            return Err(SubtitleError::InvalidSegment(format!(
                "start_seconds must be >= 0, got {start_seconds}"
            )));
        }
        if end_seconds <= start_seconds {
            return Err(SubtitleError::InvalidSegment(format!(
                "end_seconds ({end_seconds}) must be greater than start_seconds ({start_seconds})"
            )));
        }
        if trimmed.is_empty() {
            return Err(SubtitleError::InvalidSegment(
                "text must be non-empty after trim".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SubtitleError::InvalidSegment(format!(
                "confidence must be in [0, 1], got {confidence}"
            )));
        }

        Ok(Self {
            start_seconds,
            end_seconds,
            text: trimmed.to_string(),
            confidence,
        })
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_equal_start_and_end() {
        let err = SubtitleSegment::new(1.0, 1.0, "hi", 0.9);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_empty_text() {
        assert!(SubtitleSegment::new(0.0, 1.0, "   ", 0.9).is_err());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        assert!(SubtitleSegment::new(0.0, 1.0, "hi", 1.5).is_err());
        assert!(SubtitleSegment::new(0.0, 1.0, "hi", -0.1).is_err());
    }

    #[test]
    fn trims_text() {
        let seg = SubtitleSegment::new(0.0, 1.0, "  hello  ", 0.9).unwrap();
        assert_eq!(seg.text, "hello");
    }
}
