//! Skip engine — decides whether a media file should be processed at
//! all, given the target language, existing subtitles, audio tracks, and
//! a read-only `SkipConfig` snapshot.
//!
//! Rules are evaluated in order; the first match wins. External subtitle
//! discovery is a stem-prefix scan over the full subtitle extension set,
//! recognizing the `subgen` "ours" marker as a dotted filename component.

use std::path::Path;

use crate::domain::services::extensions::SUBTITLE_EXTENSIONS;
use crate::domain::value_objects::{languages_match, AudioTrack, InternalSubtitleStream, SkipConfig};

/// The outcome of a skip evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipResult {
    pub skip: bool,
    pub reason: Option<String>,
}

impl SkipResult {
    fn proceed() -> Self {
        Self { skip: false, reason: None }
    }

    fn skip(reason: impl Into<String>) -> Self {
        Self { skip: true, reason: Some(reason.into()) }
    }
}

/// An external subtitle file discovered alongside the media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSubtitle {
    pub file_path: String,
    /// Best-effort language guess from the filename's dotted components.
    pub language: Option<String>,
    /// Whether the `subgen` marker appears as a dotted component.
    pub is_ours: bool,
}

/// Scans `media_path`'s directory for subtitle files whose stem prefixes
/// the media's stem and whose extension is in the subtitle extension set.
pub fn discover_external_subtitles(media_path: &Path) -> Vec<ExternalSubtitle> {
    let mut found = Vec::new();

    let media_stem = match media_path.file_stem().and_then(|s| s.to_str()) {
        Some(s) => s.to_lowercase(),
        None => return found,
    };
    let parent = match media_path.parent() {
        Some(p) => p,
        None => return found,
    };
    let entries = match std::fs::read_dir(parent) {
        Ok(e) => e,
        Err(_) => return found,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(e) => e.to_lowercase(),
            None => continue,
        };
        if !SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_lowercase(),
            None => continue,
        };
        if !stem.starts_with(&media_stem) {
            continue;
        }

        let remainder = &stem[media_stem.len()..];
        let parts: Vec<&str> = remainder.split('.').filter(|p| !p.is_empty()).collect();
        let is_ours = parts.iter().any(|p| *p == "subgen");
        let language = parts.into_iter().find(|p| *p != "subgen").map(str::to_string);

        found.push(ExternalSubtitle {
            file_path: path.to_string_lossy().to_string(),
            language,
            is_ours,
        });
    }

    found
}

fn filter_ours(subs: &[ExternalSubtitle], only_subgen: bool) -> Vec<&ExternalSubtitle> {
    subs.iter().filter(|s| !only_subgen || s.is_ours).collect()
}

/// Evaluates the skip rules in order against a media file. `external_subs` and
/// `audio_tracks`/`internal_subs` are supplied by the caller (already
/// probed) so this function stays pure and unit-testable.
pub fn evaluate(
    media_path: &Path,
    target_language: &str,
    cfg: &SkipConfig,
    external_subs: &[ExternalSubtitle],
    audio_tracks: &[AudioTrack],
    internal_subs: &[InternalSubtitleStream],
) -> SkipResult {
    // R0
    if !media_path.exists() {
        return SkipResult::skip("file not found");
    }

    // R1
    if cfg.skip_if_target_exists {
        let relevant = filter_ours(external_subs, cfg.only_subgen);
        if relevant
            .iter()
            .any(|s| s.language.as_deref().is_some_and(|l| languages_match(l, target_language)))
        {
            return SkipResult::skip(format!("subtitle already exists for '{target_language}'"));
        }
    }

    // R2
    if cfg.skip_if_any_external_exists {
        let relevant = filter_ours(external_subs, cfg.only_subgen);
        if !relevant.is_empty() {
            return SkipResult::skip("external subtitles already exist");
        }
    }

    // R3
    if let Some(internal_lang) = &cfg.internal_language {
        if internal_subs
            .iter()
            .any(|s| s.language_tag.as_deref().is_some_and(|l| languages_match(l, internal_lang)))
        {
            return SkipResult::skip(format!("internal subtitles exist in '{internal_lang}'"));
        }
    }

    // R4
    if !cfg.audio_skip_languages.is_empty() {
        let hit = audio_tracks.iter().any(|t| {
            t.language_tag
                .as_deref()
                .is_some_and(|tag| cfg.audio_skip_languages.iter().any(|skip| languages_match(tag, skip)))
        });
        if hit {
            return SkipResult::skip("audio track language in skip list");
        }
    }

    // R5
    if !cfg.subtitle_skip_languages.is_empty() {
        let mut hit_lang: Option<&str> = None;
        for sub in internal_subs {
            if let Some(tag) = &sub.language_tag {
                if cfg.subtitle_skip_languages.iter().any(|skip| languages_match(tag, skip)) {
                    hit_lang = Some(tag);
                    break;
                }
            }
        }
        if hit_lang.is_none() {
            for sub in external_subs {
                if let Some(lang) = &sub.language {
                    if cfg.subtitle_skip_languages.iter().any(|skip| languages_match(lang, skip)) {
                        hit_lang = Some(lang);
                        break;
                    }
                }
            }
        }
        if let Some(lang) = hit_lang {
            return SkipResult::skip(format!("contains subtitle in skip list language '{lang}'"));
        }
    }

    // R6
    if cfg.skip_unknown_audio && audio_tracks.iter().any(|t| t.language_tag.is_none()) {
        return SkipResult::skip("audio track has unknown language");
    }

    // R7
    if cfg.skip_if_no_audio_lang_but_subs_exist {
        let no_audio_lang = !audio_tracks.is_empty() && audio_tracks.iter().all(|t| t.language_tag.is_none());
        let subs_exist = !internal_subs.is_empty() || !external_subs.is_empty();
        if no_audio_lang && subs_exist {
            return SkipResult::skip("no audio language set but subtitles already exist");
        }
    }

    // R8
    if cfg.limit_to_preferred_audio && !cfg.preferred_audio_languages.is_empty() {
        let matches_preferred = audio_tracks.iter().any(|t| {
            t.language_tag
                .as_deref()
                .is_some_and(|tag| cfg.preferred_audio_languages.iter().any(|pref| languages_match(tag, pref)))
        });
        if !matches_preferred {
            return SkipResult::skip("no audio track in preferred languages");
        }
    }

    SkipResult::proceed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::normalize_language_tag;

    fn track(index: usize, lang: Option<&str>) -> AudioTrack {
        AudioTrack {
            index,
            codec: "aac".to_string(),
            channels: 2,
            language_tag: lang.map(str::to_string),
            title: None,
            is_default: index == 0,
        }
    }

    fn ext_sub(lang: Option<&str>, ours: bool) -> ExternalSubtitle {
        ExternalSubtitle {
            file_path: "movie.en.srt".to_string(),
            language: lang.map(str::to_string),
            is_ours: ours,
        }
    }

    #[test]
    fn r1_skips_when_target_subtitle_exists() {
        let cfg = SkipConfig { skip_if_target_exists: true, ..Default::default() };
        let subs = vec![ext_sub(Some("en"), false)];
        let result = evaluate(Path::new("/tmp"), "en", &cfg, &subs, &[], &[]);
        assert!(result.skip);
        assert_eq!(result.reason.unwrap(), "subtitle already exists for 'en'");
    }

    #[test]
    fn r1_respects_only_subgen_filter() {
        let cfg = SkipConfig { skip_if_target_exists: true, only_subgen: true, ..Default::default() };
        let subs = vec![ext_sub(Some("en"), false)];
        let result = evaluate(Path::new("/tmp"), "en", &cfg, &subs, &[], &[]);
        assert!(!result.skip);
    }

    #[test]
    fn r4_skips_on_audio_language_in_skip_list() {
        let cfg = SkipConfig {
            audio_skip_languages: vec!["ja".to_string()],
            ..Default::default()
        };
        let tracks = vec![track(0, Some("ja"))];
        let result = evaluate(Path::new("/tmp"), "en", &cfg, &[], &tracks, &[]);
        assert!(result.skip);
    }

    #[test]
    fn r6_skips_on_unknown_audio_language() {
        let cfg = SkipConfig { skip_unknown_audio: true, ..Default::default() };
        let tracks = vec![track(0, normalize_language_tag("und").as_deref())];
        let result = evaluate(Path::new("/tmp"), "en", &cfg, &[], &tracks, &[]);
        assert!(result.skip);
    }

    #[test]
    fn r7_requires_both_missing_audio_lang_and_existing_subs() {
        let cfg = SkipConfig { skip_if_no_audio_lang_but_subs_exist: true, ..Default::default() };
        let tracks = vec![track(0, None)];
        let no_subs = evaluate(Path::new("/tmp"), "en", &cfg, &[], &tracks, &[]);
        assert!(!no_subs.skip);

        let subs = vec![ext_sub(Some("fr"), false)];
        let with_subs = evaluate(Path::new("/tmp"), "en", &cfg, &subs, &tracks, &[]);
        assert!(with_subs.skip);
    }

    #[test]
    fn r8_requires_preferred_audio_match() {
        let cfg = SkipConfig {
            limit_to_preferred_audio: true,
            preferred_audio_languages: vec!["ja".to_string()],
            ..Default::default()
        };
        let tracks = vec![track(0, Some("en"))];
        let result = evaluate(Path::new("/tmp"), "en", &cfg, &[], &tracks, &[]);
        assert!(result.skip);

        let tracks_ok = vec![track(0, Some("ja"))];
        let result_ok = evaluate(Path::new("/tmp"), "en", &cfg, &[], &tracks_ok, &[]);
        assert!(!result_ok.skip);
    }

    #[test]
    fn no_rule_triggers_proceeds() {
        let cfg = SkipConfig::default();
        let result = evaluate(Path::new("/tmp"), "en", &cfg, &[], &[], &[]);
        assert!(!result.skip);
        assert!(result.reason.is_none());
    }

    #[test]
    fn r0_skips_missing_file() {
        let cfg = SkipConfig::default();
        let result = evaluate(Path::new("/definitely/does/not/exist.mkv"), "en", &cfg, &[], &[], &[]);
        assert!(result.skip);
        assert_eq!(result.reason.unwrap(), "file not found");
    }
}
