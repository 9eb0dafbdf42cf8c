//! Language code registry.
//!
//! Static table mapping among ISO 639-1, 639-2/T, 639-2/B, English name,
//! native name, and the cloud service's regional locale.

use once_cell::sync::Lazy;

/// A single language entry. Every non-sentinel entry carries at least one
/// of `iso1`/`iso2t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageCode {
    pub iso1: Option<&'static str>,
    pub iso2t: Option<&'static str>,
    pub iso2b: Option<&'static str>,
    pub english_name: &'static str,
    pub native_name: &'static str,
    pub service_locale: &'static str,
}

/// Sentinel for "no match found".
pub const UNKNOWN: LanguageCode = LanguageCode {
    iso1: None,
    iso2t: None,
    iso2b: None,
    english_name: "Unknown",
    native_name: "Unknown",
    service_locale: "",
};

/// Naming scheme used when formatting a language into a subtitle filename
/// token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingType {
    Iso6391,
    Iso6392T,
    #[default]
    Iso6392B,
    Name,
    Native,
}

macro_rules! lang {
    ($iso1:expr, $iso2t:expr, $iso2b:expr, $en:expr, $native:expr, $locale:expr) => {
        LanguageCode {
            iso1: $iso1,
            iso2t: $iso2t,
            iso2b: $iso2b,
            english_name: $en,
            native_name: $native,
            service_locale: $locale,
        }
    };
}

/// The full static registry, ordered roughly by global speaker count.
/// Every entry's `iso1`/`iso2t` pair is unique across the table (tested
/// below).
static REGISTRY: Lazy<Vec<LanguageCode>> = Lazy::new(|| {
    vec![
        lang!(Some("en"), Some("eng"), Some("eng"), "English", "English", "en-US"),
        lang!(Some("es"), Some("spa"), Some("spa"), "Spanish", "Espanol", "es-ES"),
        lang!(Some("fr"), Some("fra"), Some("fre"), "French", "Francais", "fr-FR"),
        lang!(Some("de"), Some("deu"), Some("ger"), "German", "Deutsch", "de-DE"),
        lang!(Some("it"), Some("ita"), Some("ita"), "Italian", "Italiano", "it-IT"),
        lang!(Some("pt"), Some("por"), Some("por"), "Portuguese", "Portugues", "pt-PT"),
        lang!(Some("nl"), Some("nld"), Some("dut"), "Dutch", "Nederlands", "nl-NL"),
        lang!(Some("ru"), Some("rus"), Some("rus"), "Russian", "Russkiy", "ru-RU"),
        lang!(Some("pl"), Some("pol"), Some("pol"), "Polish", "Polski", "pl-PL"),
        lang!(Some("ja"), Some("jpn"), Some("jpn"), "Japanese", "Nihongo", "ja-JP"),
        lang!(Some("ko"), Some("kor"), Some("kor"), "Korean", "Hangugeo", "ko-KR"),
        lang!(Some("zh"), Some("zho"), Some("chi"), "Chinese", "Zhongwen", "zh-CN"),
        lang!(Some("ar"), Some("ara"), Some("ara"), "Arabic", "Al-Arabiya", "ar-SA"),
        lang!(Some("hi"), Some("hin"), Some("hin"), "Hindi", "Hindi", "hi-IN"),
        lang!(Some("tr"), Some("tur"), Some("tur"), "Turkish", "Turkce", "tr-TR"),
        lang!(Some("sv"), Some("swe"), Some("swe"), "Swedish", "Svenska", "sv-SE"),
        lang!(Some("da"), Some("dan"), Some("dan"), "Danish", "Dansk", "da-DK"),
        lang!(Some("fi"), Some("fin"), Some("fin"), "Finnish", "Suomi", "fi-FI"),
        lang!(Some("no"), Some("nor"), Some("nor"), "Norwegian", "Norsk", "nb-NO"),
        lang!(Some("el"), Some("ell"), Some("gre"), "Greek", "Ellinika", "el-GR"),
        lang!(Some("he"), Some("heb"), Some("heb"), "Hebrew", "Ivrit", "he-IL"),
        lang!(Some("th"), Some("tha"), Some("tha"), "Thai", "Phasa Thai", "th-TH"),
        lang!(Some("vi"), Some("vie"), Some("vie"), "Vietnamese", "Tieng Viet", "vi-VN"),
        lang!(Some("ro"), Some("ron"), Some("rum"), "Romanian", "Romana", "ro-RO"),
        lang!(Some("uk"), Some("ukr"), Some("ukr"), "Ukrainian", "Ukrayinska", "uk-UA"),
        lang!(Some("bg"), Some("bul"), Some("bul"), "Bulgarian", "Balgarski", "bg-BG"),
        lang!(Some("hr"), Some("hrv"), Some("hrv"), "Croatian", "Hrvatski", "hr-HR"),
        lang!(Some("sk"), Some("slk"), Some("slo"), "Slovak", "Slovencina", "sk-SK"),
        lang!(Some("sl"), Some("slv"), Some("slv"), "Slovenian", "Slovenscina", "sl-SI"),
        lang!(Some("cs"), Some("ces"), Some("cze"), "Czech", "Cestina", "cs-CZ"),
        lang!(Some("hu"), Some("hun"), Some("hun"), "Hungarian", "Magyar", "hu-HU"),
        lang!(None, Some("yue"), Some("yue"), "Cantonese", "Gwongdungwaa", "zh-HK"),
    ]
});

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Tries ISO-1, then ISO-2/T, then ISO-2/B, then English name, then native
/// name; case-insensitive, trimmed. Returns `UNKNOWN` on no match.
pub fn from_any(s: &str) -> LanguageCode {
    let needle = normalize(s);
    if needle.is_empty() {
        return UNKNOWN;
    }

    for entry in REGISTRY.iter() {
        if entry.iso1.map(normalize).as_deref() == Some(needle.as_str()) {
            return *entry;
        }
    }
    for entry in REGISTRY.iter() {
        if entry.iso2t.map(normalize).as_deref() == Some(needle.as_str()) {
            return *entry;
        }
    }
    for entry in REGISTRY.iter() {
        if entry.iso2b.map(normalize).as_deref() == Some(needle.as_str()) {
            return *entry;
        }
    }
    for entry in REGISTRY.iter() {
        if normalize(entry.english_name) == needle {
            return *entry;
        }
    }
    for entry in REGISTRY.iter() {
        if normalize(entry.native_name) == needle {
            return *entry;
        }
    }
    UNKNOWN
}

/// Maps a language to the cloud service's regional BCP-47 locale, defaulting
/// regions the way the orchestrator does for a bare ISO-1 code
/// (e.g. `en` -> `en-US`).
pub fn to_service_locale(code: &LanguageCode) -> String {
    if code.service_locale.is_empty() {
        "en-US".to_string()
    } else {
        code.service_locale.to_string()
    }
}

/// Formats a language code into a filename token under the given naming
/// scheme. Falls back to the raw ISO-2/B (or ISO-1, or "und") if the
/// requested field is absent.
pub fn to_naming(code: &LanguageCode, naming_type: NamingType) -> String {
    let primary = match naming_type {
        NamingType::Iso6391 => code.iso1.map(str::to_string),
        NamingType::Iso6392T => code.iso2t.map(str::to_string),
        NamingType::Iso6392B => code.iso2b.map(str::to_string),
        NamingType::Name => Some(code.english_name.to_string()),
        NamingType::Native => Some(code.native_name.to_string()),
    };

    primary
        .or_else(|| code.iso2b.map(str::to_string))
        .or_else(|| code.iso2t.map(str::to_string))
        .or_else(|| code.iso1.map(str::to_string))
        .unwrap_or_else(|| "und".to_string())
}

/// Equality across spellings: two language tags are "the same language" if
/// `from_any` resolves them to the same registry entry (falling back to raw
/// case-insensitive string equality, e.g. for two unknown tags).
pub fn languages_match(a: &str, b: &str) -> bool {
    let ca = from_any(a);
    let cb = from_any(b);
    if ca != UNKNOWN && cb != UNKNOWN {
        return ca == cb;
    }
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_any_resolves_every_spelling() {
        assert_eq!(from_any("en").english_name, "English");
        assert_eq!(from_any("ENG").english_name, "English");
        assert_eq!(from_any(" eng ").english_name, "English");
        assert_eq!(from_any("English").english_name, "English");
        assert_eq!(from_any("english").english_name, "English");
    }

    #[test]
    fn from_any_returns_unknown_on_no_match() {
        assert_eq!(from_any("xx-nope"), UNKNOWN);
        assert_eq!(from_any(""), UNKNOWN);
    }

    #[test]
    fn to_service_locale_defaults_region() {
        let en = from_any("en");
        assert_eq!(to_service_locale(&en), "en-US");
    }

    #[test]
    fn to_naming_default_is_iso_639_2_b() {
        let fr = from_any("fr");
        assert_eq!(to_naming(&fr, NamingType::default()), "fre");
        assert_eq!(to_naming(&fr, NamingType::Iso6391), "fr");
        assert_eq!(to_naming(&fr, NamingType::Name), "French");
    }

    #[test]
    fn to_naming_is_idempotent_for_valid_iso1() {
        let code = from_any("fr");
        let token = to_naming(&code, NamingType::Iso6391);
        let reparsed = from_any(&token);
        assert_eq!(to_naming(&reparsed, NamingType::Iso6391), token);
    }

    #[test]
    fn languages_match_across_spellings() {
        assert!(languages_match("en", "eng"));
        assert!(languages_match("English", "en"));
        assert!(!languages_match("en", "fr"));
    }

    #[test]
    fn languages_match_falls_back_to_raw_equality_for_unknown_tags() {
        assert!(languages_match("xx-custom", "XX-Custom"));
        assert!(!languages_match("xx-custom", "yy-custom"));
    }

    #[test]
    fn registry_has_no_duplicate_iso_codes() {
        let mut iso1s = Vec::new();
        let mut iso2ts = Vec::new();
        for entry in REGISTRY.iter() {
            if let Some(c) = entry.iso1 {
                assert!(!iso1s.contains(&c), "duplicate iso1: {c}");
                iso1s.push(c);
            }
            if let Some(c) = entry.iso2t {
                assert!(!iso2ts.contains(&c), "duplicate iso2t: {c}");
                iso2ts.push(c);
            }
        }
    }

    #[test]
    fn every_entry_has_iso1_or_iso2t() {
        for entry in REGISTRY.iter() {
            assert!(entry.iso1.is_some() || entry.iso2t.is_some());
        }
    }
}
