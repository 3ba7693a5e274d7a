//! Supported UI languages and tag resolution.
//!
//! The user language decides what the backend translates into; the menu
//! language (from the `LANG|` record) decides what the order script is
//! written in.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

pub const DEFAULT_LANGUAGE: &str = "zh-CN";

pub static SUPPORTED_LANGUAGES: [Language; 9] = [
    Language { code: "zh-CN", name: "Simplified Chinese", native_name: "简体中文" },
    Language { code: "en", name: "English", native_name: "English" },
    Language { code: "sv", name: "Swedish", native_name: "Svenska" },
    Language { code: "es", name: "Spanish", native_name: "Español" },
    Language { code: "fr", name: "French", native_name: "Français" },
    Language { code: "de", name: "German", native_name: "Deutsch" },
    Language { code: "it", name: "Italian", native_name: "Italiano" },
    Language { code: "ja", name: "Japanese", native_name: "日本語" },
    Language { code: "ko", name: "Korean", native_name: "한국어" },
];

/// `zh-CN` → `zh`, `en_US` → `en`.
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Exact match, then primary-subtag match, then the default language.
pub fn resolve(tag: &str) -> &'static Language {
    let tag = tag.trim();
    if let Some(lang) = SUPPORTED_LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(tag)) {
        return lang;
    }
    let primary = primary_subtag(tag);
    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| primary_subtag(l.code).eq_ignore_ascii_case(primary))
        .unwrap_or(&SUPPORTED_LANGUAGES[0])
}

/// English display name for any tag we know, including menu languages
/// reported by the model (`sv`, `zh`, `en-GB`).
pub fn display_name(tag: &str) -> Option<&'static str> {
    let tag = tag.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(tag))
        .or_else(|| {
            let primary = primary_subtag(tag);
            SUPPORTED_LANGUAGES
                .iter()
                .find(|l| primary_subtag(l.code).eq_ignore_ascii_case(primary))
        })
        .map(|l| l.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins() {
        assert_eq!(resolve("sv").code, "sv");
        assert_eq!(resolve("zh-CN").code, "zh-CN");
        assert_eq!(resolve("ZH-cn").code, "zh-CN");
    }

    #[test]
    fn primary_subtag_match() {
        assert_eq!(resolve("zh-TW").code, "zh-CN");
        assert_eq!(resolve("en-GB").code, "en");
        assert_eq!(resolve("fr_CA").code, "fr");
    }

    #[test]
    fn unknown_falls_back_to_default() {
        assert_eq!(resolve("pt-BR").code, DEFAULT_LANGUAGE);
        assert_eq!(resolve("").code, DEFAULT_LANGUAGE);
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("zh"), Some("Simplified Chinese"));
        assert_eq!(display_name("de"), Some("German"));
        assert_eq!(display_name("xx"), None);
    }
}
