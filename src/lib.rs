//! menu-scan: client for a streaming menu-translation backend.
//!
//! The backend answers every request with a `text/event-stream` body. This
//! crate reassembles those streams chunk by chunk, decodes the line
//! micro-format (`LANG|`, `INTRO|`, `CAT|`, `ITEM|`, `ERROR|`) into records
//! as they arrive, and drives the three user flows:
//!   - session.rs  analyze a menu photo into a `MenuSession`
//!   - order.rs    turn a cart into a two-part order script
//!   - ask.rs      stream answers to questions about one dish
//!
//! Decoding lives in `stream` and never touches the network; `transport`
//! and `client` feed it bytes.

pub mod ask;
pub mod cart;
pub mod client;
pub mod config;
pub mod error;
pub mod image_check;
pub mod language;
pub mod order;
pub mod session;
pub mod stream;
pub mod transport;

pub use ask::{ask_dish, DishConversation};
pub use cart::{Cart, OrderRequest};
pub use client::MenuClient;
pub use config::Config;
pub use error::ScanError;
pub use image_check::MenuImage;
pub use order::{generate_order, OrderSession};
pub use session::{analyze_menu, FlowState, MenuSession};
pub use transport::{ChunkSource, HttpChunkStream, MemoryChunkSource};
