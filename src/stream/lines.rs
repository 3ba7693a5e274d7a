//! Line record tokenizer for the menu micro-format.
//!
//! Every logical line starts with a prefix (`LANG|`, `INTRO|`, `CAT|`,
//! `ITEM|`, `ERROR|`). Lines are emitted as soon as their `\n` arrives;
//! the unterminated tail stays in the carry until more text comes in or
//! the stream ends.

use serde::Serialize;

use super::item::ItemView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    Lang,
    Intro,
    Cat,
    Item,
    Error,
}

/// Dispatch table. Order is the match precedence.
const PREFIXES: [(&str, RecordKind); 5] = [
    ("LANG|", RecordKind::Lang),
    ("INTRO|", RecordKind::Intro),
    ("CAT|", RecordKind::Cat),
    ("ITEM|", RecordKind::Item),
    ("ERROR|", RecordKind::Error),
];

impl RecordKind {
    pub fn prefix(self) -> &'static str {
        PREFIXES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(prefix, _)| *prefix)
            .unwrap_or_default()
    }
}

/// One decoded protocol line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub kind: RecordKind,
    pub payload: String,
    /// Stable key, assigned in decode order.
    pub sequence_id: u64,
}

impl Record {
    /// Structured view of an ITEM record; `None` for other kinds.
    pub fn item_view(&self) -> Option<ItemView> {
        (self.kind == RecordKind::Item).then(|| ItemView::from_payload(&self.payload))
    }
}

/// Split a line into kind and payload. Unprefixed lines fall back to ITEM
/// with the whole line as payload.
pub fn classify_line(line: &str) -> (RecordKind, String) {
    let line = line.trim();
    for (prefix, kind) in PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return (kind, rest.trim().to_string());
        }
    }
    log::debug!("[DECODE] Unprefixed line treated as ITEM: {}", line);
    (RecordKind::Item, line.to_string())
}

#[derive(Debug, Default)]
pub struct LineTokenizer {
    carry: String,
    next_sequence: u64,
}

impl LineTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering at `first_sequence` so ids stay unique across
    /// several decodes feeding the same session.
    pub fn starting_at(first_sequence: u64) -> Self {
        Self {
            carry: String::new(),
            next_sequence: first_sequence,
        }
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// The unterminated tail still waiting for its newline.
    pub fn carry(&self) -> &str {
        &self.carry
    }

    /// Append decoded text and return every line it completed.
    pub fn push(&mut self, text: &str) -> Vec<Record> {
        self.carry.push_str(text);
        let Some(last_newline) = self.carry.rfind('\n') else {
            return Vec::new();
        };
        let complete: String = self.carry.drain(..=last_newline).collect();
        complete
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.make_record(line))
            .collect()
    }

    /// Decode whatever is left in the carry as a final line. Calling this
    /// again (or on an empty carry) yields nothing.
    pub fn flush(&mut self) -> Option<Record> {
        let rest = std::mem::take(&mut self.carry);
        if rest.trim().is_empty() {
            return None;
        }
        Some(self.make_record(&rest))
    }

    fn make_record(&mut self, line: &str) -> Record {
        let (kind, payload) = classify_line(line);
        let sequence_id = self.next_sequence;
        self.next_sequence += 1;
        Record {
            kind,
            payload,
            sequence_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_dispatch_and_strip() {
        assert_eq!(classify_line("LANG| en"), (RecordKind::Lang, "en".to_string()));
        assert_eq!(
            classify_line("INTRO| Served until noon."),
            (RecordKind::Intro, "Served until noon.".to_string())
        );
        assert_eq!(classify_line("CAT| Starters"), (RecordKind::Cat, "Starters".to_string()));
        assert_eq!(
            classify_line("ITEM| Soup | Soup | 5€ | Warm"),
            (RecordKind::Item, "Soup | Soup | 5€ | Warm".to_string())
        );
        assert_eq!(classify_line("ERROR| not a menu"), (RecordKind::Error, "not a menu".to_string()));
    }

    #[test]
    fn unprefixed_line_falls_back_to_item() {
        assert_eq!(
            classify_line("Paella | Paella | 12€ | Rice"),
            (RecordKind::Item, "Paella | Paella | 12€ | Rice".to_string())
        );
    }

    #[test]
    fn crlf_line_endings_are_trimmed() {
        let mut tok = LineTokenizer::new();
        let records = tok.push("CAT| Drinks\r\n");
        assert_eq!(records[0].payload, "Drinks");
    }

    #[test]
    fn complete_lines_emitted_tail_carried() {
        let mut tok = LineTokenizer::new();
        let records = tok.push("LANG| sv\nCAT| Var");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::Lang);
        assert_eq!(tok.carry(), "CAT| Var");

        let records = tok.push("mrätter\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, "Varmrätter");
        assert_eq!(tok.carry(), "");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut tok = LineTokenizer::new();
        let records = tok.push("\n\n  \nCAT| A\n\n");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn sequence_ids_are_monotonic() {
        let mut tok = LineTokenizer::starting_at(10);
        let mut records = tok.push("ITEM| a\nITEM| a\n");
        records.extend(tok.flush());
        records.extend(tok.push("ITEM| a"));
        records.extend(tok.flush());
        let ids: Vec<u64> = records.iter().map(|r| r.sequence_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(tok.next_sequence(), 13);
    }

    #[test]
    fn flush_decodes_final_carry_once() {
        let mut tok = LineTokenizer::new();
        assert!(tok.push("ITEM| X | Y | | note").is_empty());
        let record = tok.flush().unwrap();
        assert_eq!(record.kind, RecordKind::Item);
        assert_eq!(record.payload, "X | Y | | note");
        assert!(tok.flush().is_none());
    }

    #[test]
    fn flush_on_empty_or_blank_carry_is_noop() {
        let mut tok = LineTokenizer::new();
        assert!(tok.flush().is_none());
        tok.push("CAT| A\n   ");
        assert!(tok.flush().is_none());
    }

    #[test]
    fn item_view_only_for_items() {
        let mut tok = LineTokenizer::new();
        let records = tok.push("CAT| A\nITEM| a | b | c | d\n");
        assert!(records[0].item_view().is_none());
        assert!(records[1].item_view().is_some());
    }

    #[test]
    fn prefix_round_trips_kind() {
        assert_eq!(RecordKind::Intro.prefix(), "INTRO|");
        assert_eq!(RecordKind::Error.prefix(), "ERROR|");
    }
}
