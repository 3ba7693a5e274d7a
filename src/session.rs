//! Menu session state and the analyze-menu flow.
//!
//! `MenuSession` accumulates decoded records in arrival order, captures the
//! menu language from the first `LANG|` record and tracks the flow through
//! an explicit `FlowState`. `analyze_menu` is the error boundary: it never
//! returns an error, it ends the session in `Failed(message)` instead.

use serde::Serialize;

use crate::client::MenuClient;
use crate::error::{ScanError, ANALYSIS_FAILURE};
use crate::image_check::MenuImage;
use crate::stream::{DecodeMode, ItemView, MenuEvent, MenuStreamDecoder, Record, RecordKind};
use crate::transport::ChunkSource;

// ── Flow state ───────────────────────────────────────────────────────

/// `Idle → Streaming → Completed | Failed`. One per flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum FlowState {
    #[default]
    Idle,
    Streaming,
    Completed,
    Failed(String),
}

impl FlowState {
    /// Enter `Streaming`. Allowed from any state; a new request replaces
    /// whatever the previous one left behind.
    pub fn start(&mut self) {
        *self = FlowState::Streaming;
    }

    /// `Streaming → Completed`. Ignored from any other state.
    pub fn complete(&mut self) -> bool {
        if *self != FlowState::Streaming {
            log::debug!("[FLOW] Ignoring completion in state {:?}", self);
            return false;
        }
        *self = FlowState::Completed;
        true
    }

    /// `Streaming → Failed`. Ignored from any other state.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if *self != FlowState::Streaming {
            log::debug!("[FLOW] Ignoring failure in state {:?}", self);
            return false;
        }
        *self = FlowState::Failed(message.into());
        true
    }

    pub fn is_streaming(&self) -> bool {
        *self == FlowState::Streaming
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Completed | FlowState::Failed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FlowState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

// ── Menu session ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MenuSession {
    records: Vec<Record>,
    menu_language: Option<String>,
    state: FlowState,
    /// Carried across resets so sequence ids never repeat within a session.
    next_sequence: u64,
}

impl MenuSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything from the previous analysis and enter `Streaming`.
    pub fn begin(&mut self) {
        self.records.clear();
        self.menu_language = None;
        self.state.start();
    }

    /// Fold one decoder event into the session. Events after a terminal
    /// state are dropped.
    pub fn apply(&mut self, event: MenuEvent) {
        if !self.state.is_streaming() {
            log::debug!("[MENU] Dropping event after {:?}", self.state);
            return;
        }
        match event {
            MenuEvent::Record(record) => self.push_record(record),
            MenuEvent::Rejected(message) => {
                log::warn!(
                    "[MENU] Rejected, discarding {} records: {}",
                    self.records.len(),
                    message
                );
                self.records.clear();
                self.menu_language = None;
                self.state.fail(message);
            }
            MenuEvent::Done => {
                log::info!("[MENU] Complete: {} records", self.records.len());
                self.state.complete();
            }
        }
    }

    /// Transport failure mid-stream. Records decoded so far stay visible.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state.fail(message);
    }

    fn push_record(&mut self, record: Record) {
        self.next_sequence = self.next_sequence.max(record.sequence_id + 1);
        match record.kind {
            RecordKind::Lang => {
                if self.menu_language.is_none() && !record.payload.is_empty() {
                    log::info!("[MENU] Menu language: {}", record.payload);
                    self.menu_language = Some(record.payload);
                } else {
                    log::debug!("[MENU] Ignoring extra LANG record: {}", record.payload);
                }
            }
            RecordKind::Error => {
                // The decoder turns ERROR lines into rejections; treat a
                // stray one the same way.
                self.apply(MenuEvent::Rejected(record.payload));
            }
            _ => self.records.push(record),
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn menu_language(&self) -> Option<&str> {
        self.menu_language.as_deref()
    }

    /// First sequence id a new decoder for this session should use.
    pub fn next_sequence_id(&self) -> u64 {
        self.next_sequence
    }

    /// All displayed records (no LANG, no ERROR) in arrival order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn find(&self, sequence_id: u64) -> Option<&Record> {
        self.records.iter().find(|r| r.sequence_id == sequence_id)
    }

    pub fn intro(&self) -> impl Iterator<Item = &Record> {
        self.of_kind(RecordKind::Intro)
    }

    /// Category headings, for a jump-to-section index.
    pub fn categories(&self) -> impl Iterator<Item = &Record> {
        self.of_kind(RecordKind::Cat)
    }

    pub fn items(&self) -> impl Iterator<Item = (&Record, ItemView)> {
        self.of_kind(RecordKind::Item)
            .map(|r| (r, ItemView::from_payload(&r.payload)))
    }

    fn of_kind(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.kind == kind)
    }
}

// ── Flow ─────────────────────────────────────────────────────────────

/// Drive `source` to the end, folding every event into `session`.
/// `on_event` sees each event before it is applied.
pub async fn consume_menu_stream<S, F>(
    source: &mut S,
    session: &mut MenuSession,
    mode: DecodeMode,
    mut on_event: F,
) where
    S: ChunkSource,
    F: FnMut(&MenuEvent),
{
    session.begin();
    let mut decoder = MenuStreamDecoder::starting_at(mode, session.next_sequence_id());
    loop {
        let (events, ended) = match source.next_chunk().await {
            Ok(Some(bytes)) => (decoder.feed(&bytes), false),
            Ok(None) => (decoder.finish(), true),
            Err(e) => {
                log::error!("[MENU] Stream error: {}", e);
                session.fail(e.user_message(ANALYSIS_FAILURE));
                source.close();
                return;
            }
        };
        for event in events {
            on_event(&event);
            session.apply(event);
        }
        if session.state().is_terminal() || ended {
            break;
        }
    }
    source.close();
    // A decoder that finished without a terminal event is a bug, not a
    // producer problem; do not leave the session stuck in Streaming.
    if session.state().is_streaming() {
        session.fail(ANALYSIS_FAILURE);
    }
}

/// Upload `image`, stream the analysis and return the finished session.
pub async fn analyze_menu<F>(
    client: &MenuClient,
    image: &MenuImage,
    target_language: &str,
    on_event: F,
) -> MenuSession
where
    F: FnMut(&MenuEvent),
{
    let mut session = MenuSession::new();
    analyze_menu_into(client, &mut session, image, target_language, on_event).await;
    session
}

/// Same as `analyze_menu`, reusing an existing session (sequence ids keep
/// counting up across analyses).
pub async fn analyze_menu_into<F>(
    client: &MenuClient,
    session: &mut MenuSession,
    image: &MenuImage,
    target_language: &str,
    on_event: F,
) where
    F: FnMut(&MenuEvent),
{
    let start = std::time::Instant::now();
    let mut source = match client.analyze_menu(image, target_language).await {
        Ok(source) => source,
        Err(e) => {
            session.begin();
            session.fail(failure_message(&e));
            return;
        }
    };
    consume_menu_stream(&mut source, session, DecodeMode::Validated, on_event).await;
    log::info!(
        "[MENU] Analysis finished in {}ms: {:?}, {} records, {} bytes",
        start.elapsed().as_millis(),
        session.state(),
        session.records().len(),
        source.received()
    );
}

fn failure_message(e: &ScanError) -> String {
    log::error!("[MENU] Analysis request failed: {}", e);
    e.user_message(ANALYSIS_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryChunkSource;

    fn record(kind: RecordKind, payload: &str, sequence_id: u64) -> MenuEvent {
        MenuEvent::Record(Record {
            kind,
            payload: payload.to_string(),
            sequence_id,
        })
    }

    #[test]
    fn flow_state_transitions() {
        let mut state = FlowState::default();
        assert!(!state.complete());
        state.start();
        assert!(state.is_streaming());
        assert!(state.fail("boom"));
        assert_eq!(state.error(), Some("boom"));
        assert!(!state.complete());
        assert_eq!(state, FlowState::Failed("boom".to_string()));
        state.start();
        assert!(state.complete());
        assert!(state.is_terminal());
    }

    #[test]
    fn flow_state_serializes_tagged() {
        let json = serde_json::to_string(&FlowState::Failed("x".to_string())).unwrap();
        assert_eq!(json, r#"{"state":"failed","message":"x"}"#);
    }

    #[test]
    fn session_collects_example_menu() {
        let mut session = MenuSession::new();
        session.begin();
        session.apply(record(RecordKind::Lang, "en", 0));
        session.apply(record(RecordKind::Intro, "Served until noon.", 1));
        session.apply(record(RecordKind::Cat, "Starters", 2));
        session.apply(record(RecordKind::Item, "Soup | Soup | 5€ | Warm and light", 3));
        session.apply(MenuEvent::Done);

        assert_eq!(session.menu_language(), Some("en"));
        assert_eq!(session.intro().count(), 1);
        assert_eq!(session.categories().count(), 1);
        let items: Vec<_> = session.items().collect();
        assert_eq!(items.len(), 1);
        let fields = items[0].1.fields().unwrap();
        assert_eq!(fields.fields(), ["Soup", "Soup", "5€", "Warm and light"]);
        assert_eq!(session.state(), &FlowState::Completed);
    }

    #[test]
    fn only_first_lang_is_kept() {
        let mut session = MenuSession::new();
        session.begin();
        session.apply(record(RecordKind::Lang, "sv", 0));
        session.apply(record(RecordKind::Lang, "en", 1));
        assert_eq!(session.menu_language(), Some("sv"));
        assert!(session.records().is_empty());
    }

    #[test]
    fn rejection_discards_records() {
        let mut session = MenuSession::new();
        session.begin();
        session.apply(record(RecordKind::Lang, "zh", 0));
        session.apply(record(RecordKind::Item, "a | b | c | d", 1));
        session.apply(MenuEvent::Rejected("not a menu".to_string()));
        assert!(session.records().is_empty());
        assert_eq!(session.menu_language(), None);
        assert_eq!(session.error(), Some("not a menu"));

        session.apply(record(RecordKind::Item, "late", 2));
        assert!(session.records().is_empty());
    }

    #[test]
    fn transport_failure_keeps_partial_records() {
        let mut session = MenuSession::new();
        session.begin();
        session.apply(record(RecordKind::Cat, "Mains", 0));
        session.fail(ANALYSIS_FAILURE);
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.error(), Some(ANALYSIS_FAILURE));
    }

    #[test]
    fn begin_resets_but_keeps_sequence_counter() {
        let mut session = MenuSession::new();
        session.begin();
        session.apply(record(RecordKind::Cat, "A", 4));
        session.apply(MenuEvent::Done);
        session.begin();
        assert!(session.records().is_empty());
        assert!(session.state().is_streaming());
        assert_eq!(session.next_sequence_id(), 5);
    }

    #[tokio::test]
    async fn consume_stops_reading_after_rejection() {
        let mut source = MemoryChunkSource::new([
            "data: {\"chunk\":\"LANG| zh\\n\"}\n\n",
            "data: {\"chunk\":\"ERROR| not a menu\"}\n\n",
            "data: {\"chunk\":\"ITEM| never | read | 1 | x\\n\"}\n\n",
            "data: [DONE]\n\n",
        ]);
        let mut session = MenuSession::new();
        let mut seen = Vec::new();
        consume_menu_stream(&mut source, &mut session, DecodeMode::Validated, |e| {
            seen.push(e.clone())
        })
        .await;

        assert_eq!(session.error(), Some("not a menu"));
        assert!(session.records().is_empty());
        assert!(source.is_closed());
        assert_eq!(source.remaining(), 2);
        assert_eq!(seen.last(), Some(&MenuEvent::Rejected("not a menu".to_string())));
    }

    #[tokio::test]
    async fn consume_read_error_fails_with_generic_message() {
        let mut source =
            MemoryChunkSource::new(["data: {\"chunk\":\"CAT| A\\n\"}\n\n"]).failing_with("reset");
        let mut session = MenuSession::new();
        consume_menu_stream(&mut source, &mut session, DecodeMode::Validated, |_| {}).await;
        assert_eq!(session.error(), Some(ANALYSIS_FAILURE));
        assert_eq!(session.records().len(), 1);
    }
}
