//! SubtitleNamingConfig value object.

use crate::domain::value_objects::language_code::NamingType;

/// Read-only snapshot controlling how a language is rendered into a
/// subtitle filename token.
#[derive(Debug, Clone)]
pub struct SubtitleNamingConfig {
    pub naming_type: NamingType,
    pub show_marker: bool,
    /// Wins over `naming_type` verbatim when non-empty.
    pub override_token: Option<String>,
}

impl Default for SubtitleNamingConfig {
    fn default() -> Self {
        Self {
            naming_type: NamingType::default(),
            show_marker: false,
            override_token: None,
        }
    }
}
