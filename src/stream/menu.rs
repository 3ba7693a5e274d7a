//! Menu stream decoder: SSE frames to line records, one per request.
//!
//! Push-based: the caller feeds transport chunks and gets back whatever
//! events they completed. After a terminal event (`Done` or `Rejected`)
//! further input is ignored.

use super::lines::{LineTokenizer, Record, RecordKind};
use super::sentinel::{self, SentinelScanner};
use super::sse::{SseFrame, SseReassembler};

/// Whether the producer may reject the input mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Only `{"error"}` frames and complete `ERROR|` lines end the stream.
    Plain,
    /// Additionally scan every chunk for `ERROR|` as soon as it arrives.
    #[default]
    Validated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEvent {
    Record(Record),
    /// The producer declared the input invalid. Terminal.
    Rejected(String),
    /// Clean completion. Terminal.
    Done,
}

impl MenuEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MenuEvent::Rejected(_) | MenuEvent::Done)
    }
}

#[derive(Debug)]
pub struct MenuStreamDecoder {
    mode: DecodeMode,
    sse: SseReassembler,
    lines: LineTokenizer,
    sentinel: SentinelScanner,
    /// Decoded text so far; only kept in validated mode.
    text: String,
    finished: bool,
}

impl MenuStreamDecoder {
    pub fn new(mode: DecodeMode) -> Self {
        Self::starting_at(mode, 0)
    }

    pub fn starting_at(mode: DecodeMode, first_sequence: u64) -> Self {
        Self {
            mode,
            sse: SseReassembler::new(),
            lines: LineTokenizer::starting_at(first_sequence),
            sentinel: SentinelScanner::new(),
            text: String::new(),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next sequence id the tokenizer will hand out.
    pub fn next_sequence(&self) -> u64 {
        self.lines.next_sequence()
    }

    /// Feed one transport chunk.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<MenuEvent> {
        if self.finished {
            return Vec::new();
        }
        let frames = self.sse.push(bytes);
        self.handle_frames(frames)
    }

    /// The transport reached end of stream without (or after) `[DONE]`.
    pub fn finish(&mut self) -> Vec<MenuEvent> {
        if self.finished {
            return Vec::new();
        }
        let frames = self.sse.finish();
        let mut events = self.handle_frames(frames);
        if !self.finished {
            events.extend(self.complete());
        }
        events
    }

    fn handle_frames(&mut self, frames: Vec<SseFrame>) -> Vec<MenuEvent> {
        let mut events = Vec::new();
        for frame in frames {
            match frame {
                SseFrame::Text(text) => {
                    if self.mode == DecodeMode::Validated {
                        self.text.push_str(&text);
                        if let Some(message) = self.sentinel.scan(&self.text) {
                            events.push(self.reject(message));
                            return events;
                        }
                    }
                    let records = self.lines.push(&text);
                    if self.push_records(records, &mut events) {
                        return events;
                    }
                }
                SseFrame::Error(message) => {
                    log::warn!("[DECODE] Producer error frame: {}", message);
                    events.push(self.reject(message));
                    return events;
                }
                SseFrame::Done => {
                    events.extend(self.complete());
                    return events;
                }
            }
        }
        events
    }

    /// Final sentinel scan, flush of the line carry, then `Done`.
    fn complete(&mut self) -> Vec<MenuEvent> {
        let mut events = Vec::new();
        if self.mode == DecodeMode::Validated {
            if let Some(message) = self.sentinel.scan(&self.text) {
                events.push(self.reject(message));
                return events;
            }
        }
        let tail: Vec<Record> = self.lines.flush().into_iter().collect();
        if self.push_records(tail, &mut events) {
            return events;
        }
        self.finished = true;
        events.push(MenuEvent::Done);
        events
    }

    /// Convert records to events. An ERROR record ends the stream; returns
    /// true in that case.
    fn push_records(&mut self, records: Vec<Record>, events: &mut Vec<MenuEvent>) -> bool {
        for record in records {
            if record.kind == RecordKind::Error {
                let message = if record.payload.is_empty() {
                    sentinel::REJECTION_FALLBACK.to_string()
                } else {
                    record.payload
                };
                events.push(self.reject(message));
                return true;
            }
            log::debug!(
                "[DECODE] #{} {:?}: {}",
                record.sequence_id,
                record.kind,
                record.payload
            );
            events.push(MenuEvent::Record(record));
        }
        false
    }

    fn reject(&mut self, message: String) -> MenuEvent {
        self.finished = true;
        MenuEvent::Rejected(message)
    }
}
