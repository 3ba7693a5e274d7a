//! Streaming decode, bottom up.
//!
//!   - sse.rs      bytes → `data:` frames (UTF-8 and frame reassembly)
//!   - lines.rs    frame text → prefixed line records
//!   - item.rs     ITEM payload → four display fields
//!   - sentinel.rs incremental `ERROR|` detection
//!   - script.rs   two-part order script
//!   - menu.rs     sse + lines + sentinel composed per request

pub mod item;
pub mod lines;
pub mod menu;
pub mod script;
pub mod sentinel;
pub mod sse;

pub use item::{ItemFields, ItemView};
pub use lines::{LineTokenizer, Record, RecordKind};
pub use menu::{DecodeMode, MenuEvent, MenuStreamDecoder};
pub use script::{OrderScript, ScriptDecoder};
pub use sse::{SseFrame, SseReassembler};
