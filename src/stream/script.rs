//! Two-part order script decoder.
//!
//! The order endpoint streams a speak-to-staff section, a `---` line, then
//! the same text in the user's language. The whole accumulated text is
//! rescanned on every chunk so a delimiter split across chunks is still
//! found.

use serde::Serialize;

pub const SCRIPT_DELIMITER: &str = "\n---\n";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderScript {
    /// What to show or read to the staff, in the menu's language.
    pub target: String,
    /// Confirmation for the user, in their own language.
    pub translation: String,
}

#[derive(Debug, Default)]
pub struct ScriptDecoder {
    accumulated: String,
    script: OrderScript,
    split: bool,
}

impl ScriptDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return the updated view.
    pub fn push(&mut self, text: &str) -> &OrderScript {
        self.accumulated.push_str(text);
        self.reparse();
        &self.script
    }

    pub fn script(&self) -> &OrderScript {
        &self.script
    }

    /// True once the delimiter has been seen.
    pub fn has_delimiter(&self) -> bool {
        self.split
    }

    pub fn into_script(self) -> OrderScript {
        self.script
    }

    fn reparse(&mut self) {
        match self.accumulated.find(SCRIPT_DELIMITER) {
            Some(idx) => {
                self.script.target = self.accumulated[..idx].trim().to_string();
                self.script.translation = self.accumulated[idx + SCRIPT_DELIMITER.len()..]
                    .trim()
                    .to_string();
                self.split = true;
            }
            None => {
                self.script.target = self.accumulated.trim().to_string();
                self.split = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_split_on_delimiter() {
        let mut decoder = ScriptDecoder::new();
        assert_eq!(decoder.push("Bonjour").target, "Bonjour");
        decoder.push("\n---\n");
        assert!(decoder.has_delimiter());
        let script = decoder.push("Hello");
        assert_eq!(script.target, "Bonjour");
        assert_eq!(script.translation, "Hello");
    }

    #[test]
    fn delimiter_split_char_by_char() {
        let mut decoder = ScriptDecoder::new();
        decoder.push("Bonjour");
        for ch in SCRIPT_DELIMITER.chars() {
            decoder.push(&ch.to_string());
            assert!(decoder.script().translation.is_empty());
        }
        assert!(decoder.has_delimiter());
        assert_eq!(decoder.script().target, "Bonjour");
        decoder.push("Hel");
        decoder.push("lo");
        assert_eq!(decoder.script().target, "Bonjour");
        assert_eq!(decoder.script().translation, "Hello");
    }

    #[test]
    fn translation_keeps_growing() {
        let mut decoder = ScriptDecoder::new();
        decoder.push("Hej, jag vill beställa köttbullar. Tack.\n---\n");
        assert_eq!(decoder.script().translation, "");
        decoder.push("Hi, I'd like ");
        decoder.push("the meatballs. Thanks.");
        assert_eq!(decoder.script().translation, "Hi, I'd like the meatballs. Thanks.");
    }

    #[test]
    fn missing_delimiter_leaves_translation_empty() {
        let mut decoder = ScriptDecoder::new();
        decoder.push("  Ciao, vorrei ");
        decoder.push("una pizza.  ");
        let script = decoder.into_script();
        assert_eq!(script.target, "Ciao, vorrei una pizza.");
        assert_eq!(script.translation, "");
    }

    #[test]
    fn only_first_delimiter_splits() {
        let mut decoder = ScriptDecoder::new();
        decoder.push("A\n---\nB\n---\nC");
        assert_eq!(decoder.script().target, "A");
        assert_eq!(decoder.script().translation, "B\n---\nC");
    }
}
