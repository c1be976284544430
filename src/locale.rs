//! Locales the gateway speaks

use serde::{Deserialize, Serialize};

/// Supported locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// German (Germany)
    #[default]
    #[serde(rename = "de-DE")]
    DeDe,

    /// English (United States)
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    /// All supported locales, in catalog order
    pub const ALL: [Self; 2] = [Self::EnUs, Self::DeDe];

    /// BCP 47 tag
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::DeDe => "de-DE",
            Self::EnUs => "en-US",
        }
    }

    /// Parse a locale tag, matching on language only
    ///
    /// `de-AT` resolves to German, `en-GB` to English.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let language = tag.split(['-', '_']).next()?.to_ascii_lowercase();
        match language.as_str() {
            "de" => Some(Self::DeDe),
            "en" => Some(Self::EnUs),
            _ => None,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_language() {
        assert_eq!(Locale::parse("de-DE"), Some(Locale::DeDe));
        assert_eq!(Locale::parse("de-AT"), Some(Locale::DeDe));
        assert_eq!(Locale::parse("en_GB"), Some(Locale::EnUs));
        assert_eq!(Locale::parse("fr-FR"), None);
    }

    #[test]
    fn test_serde_uses_tags() {
        assert_eq!(serde_json::to_string(&Locale::EnUs).unwrap(), "\"en-US\"");
        let l: Locale = serde_json::from_str("\"de-DE\"").unwrap();
        assert_eq!(l, Locale::DeDe);
    }
}
