//! Pull-based chunk sources feeding the decoders.
//!
//! `HttpChunkStream` wraps a live reqwest response; `MemoryChunkSource`
//! replays fixed chunks (tests, recorded sessions). Closing is idempotent
//! and dropping a source abandons any pending read.

use std::collections::VecDeque;
use std::future::Future;

use crate::error::ScanError;
use crate::stream::{SseFrame, SseReassembler};

pub trait ChunkSource: Send {
    /// Next piece of the body, `None` at end of stream.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, ScanError>> + Send;

    /// Stop reading. Safe to call more than once; later reads return `None`.
    fn close(&mut self);
}

/// Response body of a streaming endpoint.
#[derive(Debug)]
pub struct HttpChunkStream {
    response: Option<reqwest::Response>,
    received: usize,
}

impl HttpChunkStream {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            response: Some(response),
            received: 0,
        }
    }

    /// Bytes read so far.
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn is_closed(&self) -> bool {
        self.response.is_none()
    }
}

impl ChunkSource for HttpChunkStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ScanError> {
        let Some(response) = self.response.as_mut() else {
            return Ok(None);
        };
        match response.chunk().await {
            Ok(Some(chunk)) => {
                self.received += chunk.len();
                Ok(Some(chunk.to_vec()))
            }
            Ok(None) => {
                log::debug!("[HTTP] Body complete after {} bytes", self.received);
                self.response = None;
                Ok(None)
            }
            Err(e) => {
                self.response = None;
                Err(ScanError::Http(e))
            }
        }
    }

    fn close(&mut self) {
        if self.response.take().is_some() {
            log::debug!("[HTTP] Stream closed by consumer after {} bytes", self.received);
        }
    }
}

/// Read `source` to the end as SSE text frames, handing each piece of text
/// to `on_text`. Stops at `[DONE]` or end of body; an `{"error"}` frame
/// becomes `ScanError::Rejected`. The source is closed either way.
pub async fn read_text_frames<S, F>(source: &mut S, mut on_text: F) -> Result<(), ScanError>
where
    S: ChunkSource,
    F: FnMut(&str),
{
    let mut sse = SseReassembler::new();
    let result = loop {
        let (frames, ended) = match source.next_chunk().await {
            Ok(Some(bytes)) => (sse.push(&bytes), false),
            Ok(None) => (sse.finish(), true),
            Err(e) => break Err(e),
        };
        let mut terminal = None;
        for frame in frames {
            match frame {
                SseFrame::Text(text) => on_text(&text),
                SseFrame::Error(message) => {
                    terminal = Some(Err(ScanError::Rejected(message)));
                    break;
                }
                SseFrame::Done => {
                    terminal = Some(Ok(()));
                    break;
                }
            }
        }
        if let Some(result) = terminal {
            break result;
        }
        if ended {
            break Ok(());
        }
    };
    source.close();
    result
}

/// Replays a fixed list of chunks, optionally ending in a read error.
#[derive(Debug, Default)]
pub struct MemoryChunkSource {
    chunks: VecDeque<Vec<u8>>,
    failure: Option<String>,
    closed: bool,
}

impl MemoryChunkSource {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: None,
            closed: false,
        }
    }

    /// After the chunks run out, fail with `message` instead of ending.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Chunks not yet handed out.
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

impl ChunkSource for MemoryChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ScanError> {
        if self.closed {
            return Ok(None);
        }
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        match self.failure.take() {
            Some(message) => Err(ScanError::Stream(message)),
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_source_replays_then_ends() {
        let mut source = MemoryChunkSource::new(["a", "b"]);
        assert_eq!(source.next_chunk().await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(source.next_chunk().await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(source.next_chunk().await.unwrap(), None);
        assert_eq!(source.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_source_failure_after_chunks() {
        let mut source = MemoryChunkSource::new(["a"]).failing_with("reset");
        assert!(source.next_chunk().await.unwrap().is_some());
        assert!(matches!(source.next_chunk().await, Err(ScanError::Stream(m)) if m == "reset"));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut source = MemoryChunkSource::new(["a", "b"]);
        source.close();
        source.close();
        assert!(source.is_closed());
        assert_eq!(source.next_chunk().await.unwrap(), None);
        assert_eq!(source.remaining(), 2);
    }

    #[tokio::test]
    async fn text_frames_until_done() {
        let mut source = MemoryChunkSource::new([
            "data: {\"text\":\"Yes, \"}\n\ndata: {\"te",
            "xt\":\"it is spicy.\"}\n\ndata: [DONE]\n\n",
            "data: {\"text\":\"ignored\"}\n\n",
        ]);
        let mut answer = String::new();
        read_text_frames(&mut source, |t| answer.push_str(t)).await.unwrap();
        assert_eq!(answer, "Yes, it is spicy.");
        assert!(source.is_closed());
        assert_eq!(source.remaining(), 1);
    }

    #[tokio::test]
    async fn error_frame_is_a_rejection() {
        let mut source = MemoryChunkSource::new([
            "data: {\"chunk\":\"Bon\"}\n\ndata: {\"error\":\"quota\"}\n\n",
        ]);
        let err = read_text_frames(&mut source, |_| {}).await.unwrap_err();
        assert!(matches!(err, ScanError::Rejected(m) if m == "quota"));
    }

    #[tokio::test]
    async fn read_error_propagates_and_closes() {
        let mut source = MemoryChunkSource::new(["data: {\"chunk\":\"a\"}\n\n"]).failing_with("reset");
        let mut seen = Vec::new();
        let err = read_text_frames(&mut source, |t| seen.push(t.to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Stream(_)));
        assert_eq!(seen, vec!["a".to_string()]);
        assert!(source.is_closed());
    }
}
