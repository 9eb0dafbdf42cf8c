//! Output path construction.
//!
//! `<media-stem>[.subgen]?.<langToken>[.<suffix>]?.<ext>`.

use std::path::{Path, PathBuf};

use crate::domain::value_objects::{to_naming, LanguageCode, SubtitleNamingConfig};

/// Builds the output path for a subtitle sibling of `media_path`.
pub fn build_output_path(media_path: &Path, lang: &LanguageCode, cfg: &SubtitleNamingConfig, suffix: Option<&str>, ext: &str) -> PathBuf {
    let stem = media_path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let parent = media_path.parent().unwrap_or_else(|| Path::new("."));

    let lang_token = match &cfg.override_token {
        Some(token) if !token.is_empty() => token.clone(),
        _ => to_naming(lang, cfg.naming_type),
    };

    let mut name = stem.to_string();
    if cfg.show_marker {
        name.push_str(".subgen");
    }
    name.push('.');
    name.push_str(&lang_token);
    if let Some(suffix) = suffix {
        if !suffix.is_empty() {
            name.push('.');
            name.push_str(suffix);
        }
    }
    name.push('.');
    name.push_str(ext);

    parent.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{from_any, NamingType};

    #[test]
    fn builds_default_unmarked_path() {
        let lang = from_any("en");
        let cfg = SubtitleNamingConfig::default();
        let path = build_output_path(Path::new("/media/movie.mkv"), &lang, &cfg, None, "srt");
        assert_eq!(path, PathBuf::from("/media/movie.eng.srt"));
    }

    #[test]
    fn adds_marker_when_enabled() {
        let lang = from_any("en");
        let cfg = SubtitleNamingConfig { show_marker: true, ..Default::default() };
        let path = build_output_path(Path::new("/media/movie.mkv"), &lang, &cfg, None, "srt");
        assert_eq!(path, PathBuf::from("/media/movie.subgen.eng.srt"));
    }

    #[test]
    fn override_token_wins_verbatim() {
        let lang = from_any("en");
        let cfg = SubtitleNamingConfig { override_token: Some("english".to_string()), ..Default::default() };
        let path = build_output_path(Path::new("/media/movie.mkv"), &lang, &cfg, None, "srt");
        assert_eq!(path, PathBuf::from("/media/movie.english.srt"));
    }

    #[test]
    fn naming_type_iso1_is_used_when_configured() {
        let lang = from_any("en");
        let cfg = SubtitleNamingConfig { naming_type: NamingType::Iso6391, ..Default::default() };
        let path = build_output_path(Path::new("/media/movie.mkv"), &lang, &cfg, None, "srt");
        assert_eq!(path, PathBuf::from("/media/movie.en.srt"));
    }
}
