//! SkipConfig value object — a read-only snapshot of every flag the skip
//! engine consults.

/// Recognized options for the skip-decision engine. No dynamic key
/// lookup: every flag is a named field.
#[derive(Debug, Clone, Default)]
pub struct SkipConfig {
    /// R1: skip if an external subtitle in the target language already exists.
    pub skip_if_target_exists: bool,
    /// R2: skip if any external subtitle exists at all.
    pub skip_if_any_external_exists: bool,
    /// R1/R2: only count external subtitles carrying the `subgen` marker.
    pub only_subgen: bool,
    /// R3: skip if an internal subtitle stream matches this language.
    pub internal_language: Option<String>,
    /// R4: skip if any audio track's language is in this list.
    pub audio_skip_languages: Vec<String>,
    /// R5: skip if any internal-or-external subtitle is in this list.
    pub subtitle_skip_languages: Vec<String>,
    /// R6: skip if any audio track has no/`und`/`unknown` language tag.
    pub skip_unknown_audio: bool,
    /// R7: skip if no audio track has a language tag but subtitles exist.
    pub skip_if_no_audio_lang_but_subs_exist: bool,
    /// R8: skip unless at least one audio track matches `preferred_audio_languages`.
    pub limit_to_preferred_audio: bool,
    pub preferred_audio_languages: Vec<String>,
}
