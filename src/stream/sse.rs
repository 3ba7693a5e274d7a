//! SSE frame reassembly.
//!
//! The backend writes `data: <json>\n\n` frames and ends with `data: [DONE]`.
//! Transport chunks are cut arbitrarily, so a frame (and even a multi-byte
//! UTF-8 character) can straddle two chunks. `SseReassembler` keeps the
//! unterminated tail in a carry buffer and only yields complete frames.

use serde::Deserialize;

const FRAME_DELIMITER: &str = "\n\n";
const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// A decoded `data:` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// New text to append (`chunk` or `text` field).
    Text(String),
    /// Fatal producer error (`error` field).
    Error(String),
    /// The `[DONE]` sentinel.
    Done,
}

impl SseFrame {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SseFrame::Error(_) | SseFrame::Done)
    }
}

/// JSON body of a data frame. Menu and order endpoints use `chunk`,
/// ask-dish uses `text`.
#[derive(Debug, Deserialize)]
struct FramePayload {
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl FramePayload {
    fn into_frame(self) -> Option<SseFrame> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Some(SseFrame::Error(error));
        }
        self.chunk
            .filter(|c| !c.is_empty())
            .or(self.text.filter(|t| !t.is_empty()))
            .map(SseFrame::Text)
    }
}

/// Incremental byte-to-frame reassembler. One per request.
#[derive(Debug, Default)]
pub struct SseReassembler {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending_bytes: Vec<u8>,
    /// Text after the last complete frame.
    carry: String,
    done: bool,
}

impl SseReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `[DONE]` or an error frame has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one transport chunk, returning every frame it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        if self.done || bytes.is_empty() {
            return Vec::new();
        }
        let text = self.decode_utf8(bytes);
        self.carry.push_str(&text);
        self.drain_frames()
    }

    /// Natural end of stream. A producer that closes without the final
    /// blank line still gets its last frame parsed.
    pub fn finish(&mut self) -> Vec<SseFrame> {
        if self.done {
            return Vec::new();
        }
        if !self.pending_bytes.is_empty() {
            let rest = std::mem::take(&mut self.pending_bytes);
            self.carry.push_str(&String::from_utf8_lossy(&rest));
        }
        let mut frames = self.drain_frames();
        if !self.done {
            let tail = std::mem::take(&mut self.carry);
            if !tail.trim().is_empty() {
                log::debug!("[SSE] Parsing unterminated final frame ({} bytes)", tail.len());
                if let Some(frame) = parse_frame(tail.trim_end_matches('\n')) {
                    self.done = frame.is_terminal();
                    frames.push(frame);
                }
            }
        }
        frames
    }

    fn drain_frames(&mut self) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        while let Some(pos) = self.carry.find(FRAME_DELIMITER) {
            let raw: String = self.carry.drain(..pos + FRAME_DELIMITER.len()).collect();
            let Some(frame) = parse_frame(&raw[..pos]) else {
                continue;
            };
            let terminal = frame.is_terminal();
            frames.push(frame);
            if terminal {
                self.done = true;
                self.carry.clear();
                break;
            }
        }
        frames
    }

    /// Decode as much of `pending_bytes + bytes` as forms complete UTF-8.
    /// Invalid sequences become U+FFFD; an incomplete tail waits for the
    /// next chunk.
    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending_bytes);
        buf.extend_from_slice(bytes);

        let mut out = String::with_capacity(buf.len());
        let mut rest: &[u8] = &buf;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        self.pending_bytes = rest.to_vec();
        out
    }
}

/// Parse one complete frame. `None` means "skip" (not a data frame, bad
/// JSON, or an empty payload).
fn parse_frame(raw: &str) -> Option<SseFrame> {
    let Some(data) = raw.strip_prefix(DATA_PREFIX) else {
        if !raw.trim().is_empty() {
            log::debug!("[SSE] Dropping non-data frame: {}", preview(raw));
        }
        return None;
    };
    let data = data.trim_end_matches('\r');
    if data == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }
    match serde_json::from_str::<FramePayload>(data) {
        Ok(payload) => payload.into_frame(),
        Err(e) => {
            log::warn!("[SSE] Skipping unparseable frame ({}): {}", e, preview(data));
            None
        }
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(80) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
