//! Order script flow.
//!
//! Sends the cart to the backend and streams back a two-part script: the
//! part to show the staff, then the same order in the user's language.

use crate::cart::OrderRequest;
use crate::client::MenuClient;
use crate::session::FlowState;
use crate::stream::{OrderScript, ScriptDecoder};
use crate::transport::{self, ChunkSource};

pub const ORDER_FAILURE: &str = "Could not generate the order, please try again later.";

#[derive(Debug, Default)]
pub struct OrderSession {
    state: FlowState,
    script: OrderScript,
}

impl OrderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    /// Latest script. Partial while streaming, kept after a failure.
    pub fn script(&self) -> &OrderScript {
        &self.script
    }
}

/// Stream the script from `source`. `on_update` sees the script after every
/// piece of text.
pub async fn consume_order_stream<S, F>(source: &mut S, session: &mut OrderSession, mut on_update: F)
where
    S: ChunkSource,
    F: FnMut(&OrderScript),
{
    session.state.start();
    session.script = OrderScript::default();
    let mut decoder = ScriptDecoder::new();

    let result = transport::read_text_frames(source, |text| {
        on_update(decoder.push(text));
    })
    .await;

    session.script = decoder.into_script();
    match result {
        Ok(()) => {
            if !session.script.translation.is_empty() || !session.script.target.is_empty() {
                log::info!(
                    "[ORDER] Script complete: {} + {} chars",
                    session.script.target.chars().count(),
                    session.script.translation.chars().count()
                );
            } else {
                log::warn!("[ORDER] Stream ended with an empty script");
            }
            session.state.complete();
        }
        Err(e) => {
            log::error!("[ORDER] Stream failed: {}", e);
            session.state.fail(e.user_message(ORDER_FAILURE));
        }
    }
}

pub async fn generate_order<F>(client: &MenuClient, request: &OrderRequest, on_update: F) -> OrderSession
where
    F: FnMut(&OrderScript),
{
    let start = std::time::Instant::now();
    let mut session = OrderSession::new();
    match client.generate_order(request).await {
        Ok(mut source) => {
            consume_order_stream(&mut source, &mut session, on_update).await;
        }
        Err(e) => {
            log::error!("[ORDER] Request failed: {}", e);
            session.state.start();
            session.state.fail(e.user_message(ORDER_FAILURE));
        }
    }
    log::info!(
        "[ORDER] Finished in {}ms: {:?}",
        start.elapsed().as_millis(),
        session.state()
    );
    session
}
