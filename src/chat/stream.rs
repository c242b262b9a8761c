//! Streaming chat client
//!
//! This module implements the streaming half of the RAG chat protocol:
//! one HTTP POST per query, answered with a `text/event-stream`-shaped body
//! of `data: {json}\n\n` frames that carry incremental answer tokens and
//! side-channel events (source documents, retrieval progress, completion
//! timing, server errors).
//!
//! # Design
//!
//! - [`StreamingChatClient::send`] drives a whole session: it validates the
//!   caller's input, appends the user message and an empty assistant message
//!   to the [`MessageStore`], issues the request, and consumes the response
//!   stream until it ends, fails, or is cancelled.
//! - All mutable session state (the pending-token queue, the session state
//!   machine, the byte reader, the pacing timer) lives on the stack of the
//!   session that owns it. The store is borrowed `&mut` for the session's
//!   lifetime, so a superseded session cannot touch a newer session's
//!   messages, and the reader and timer cannot outlive the session.
//! - Token fragments are queued as they arrive and applied one per pacing
//!   tick, decoupling visible output from network burst timing. `sources`
//!   and `done` events bypass the queue and apply immediately.
//! - Every exit path funnels through [`StreamSession::finalize`]: the queue
//!   is flushed synchronously (no further pacing delay), the terminal state
//!   is recorded, and cancellation/error surfaces are written to the open
//!   assistant message.
//! - Cancellation is cooperative via [`CancellationToken`]; the select loop
//!   is biased toward it so a stop is observed within one chunk read.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::chat::{ChatMessage, MessageStore, SourceDocument};
use crate::config::{ApiConfig, ChatConfig};
use crate::error::{IbotError, Result};

/// Content applied when a session is stopped before any token was applied.
pub const STOPPED_MARKER: &str = "[stopped]";

/// Prefix distinguishing surfaced errors from normal assistant content.
pub const ERROR_PREFIX: &str = "Error: ";

const EVENT_DELIMITER: &[u8] = b"\n\n";

/// Lifecycle of a chat stream session.
///
/// `Streaming` is re-entered on every chunk read; the three terminal states
/// are reported back to the caller, after which the session is gone and the
/// client is idle again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    Streaming,
    Completed,
    Errored,
    Cancelled,
}

impl SessionState {
    /// Whether the session has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Errored | SessionState::Cancelled
        )
    }
}

/// Request body for the chat endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    knowledge_base_id: i64,
    query: &'a str,
    k: u32,
}

/// One decoded `data:` frame from the response stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    Token {
        content: String,
    },
    Sources {
        documents: Vec<SourceDocument>,
    },
    SearchComplete {
        doc_count: Option<u64>,
    },
    Done {
        thinking_time: Option<f64>,
    },
    Error {
        error: String,
    },
    #[serde(other)]
    Unknown,
}

/// How a session ended, before surfacing rules are applied.
#[derive(Debug)]
enum Outcome {
    Completed,
    Cancelled,
    Errored(String),
}

/// Ephemeral per-request state: the pending-token queue and the state
/// machine position. Created when a request is issued, consumed by
/// `finalize`.
#[derive(Debug)]
struct StreamSession {
    state: SessionState,
    queue: VecDeque<String>,
}

impl StreamSession {
    fn new() -> Self {
        Self {
            state: SessionState::Sending,
            queue: VecDeque::new(),
        }
    }

    /// Decode one frame and apply its event.
    ///
    /// Token content is queued; sources and timing apply to the open message
    /// immediately so they reflect server-declared state regardless of the
    /// pacing backlog. Returns the server's message for an `error` event,
    /// which aborts the stream. Malformed frames are logged and skipped.
    fn handle_frame(&mut self, frame: &str, store: &mut MessageStore) -> Option<String> {
        let frame = frame.trim();
        if frame.is_empty() {
            return None;
        }

        let Some(payload) = frame
            .strip_prefix("data: ")
            .or_else(|| frame.strip_prefix("data:"))
        else {
            tracing::debug!("ignoring non-data stream line: {frame}");
            return None;
        };

        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(StreamEvent::Token { content }) => {
                self.queue.push_back(content);
                None
            }
            Ok(StreamEvent::Sources { documents }) => {
                // An empty documents array means "no sources": the field is
                // left unset rather than set to an empty list.
                if documents.is_empty() {
                    tracing::debug!("sources event carried no documents; leaving sources unset");
                } else if let Some(msg) = store.last_assistant_mut() {
                    msg.sources = Some(documents);
                }
                None
            }
            Ok(StreamEvent::SearchComplete { doc_count }) => {
                tracing::debug!(?doc_count, "retrieval finished");
                None
            }
            Ok(StreamEvent::Done { thinking_time }) => {
                if let Some(seconds) = thinking_time {
                    if let Some(msg) = store.last_assistant_mut() {
                        msg.thinking_time = Some(seconds);
                    }
                }
                None
            }
            Ok(StreamEvent::Error { error }) => Some(error),
            Ok(StreamEvent::Unknown) => {
                tracing::debug!("ignoring stream event of unknown type: {payload}");
                None
            }
            Err(e) => {
                let err = IbotError::StreamParse(e.to_string());
                tracing::warn!("skipping malformed stream frame: {err}");
                None
            }
        }
    }

    /// Dequeue one fragment and append it to the open assistant message.
    fn apply_next(&mut self, store: &mut MessageStore, on_fragment: &mut impl FnMut(&str)) {
        if let Some(fragment) = self.queue.pop_front() {
            if let Some(msg) = store.last_assistant_mut() {
                msg.content.push_str(&fragment);
            }
            on_fragment(&fragment);
        }
    }

    /// The single termination path for every session outcome.
    ///
    /// Remaining queued fragments are applied synchronously so no trailing
    /// text is lost. A cancelled session whose message is still empty gets
    /// the stopped marker; an errored session's message is replaced with the
    /// prefixed error text. Safe to run on an already-drained session.
    fn finalize(
        &mut self,
        store: &mut MessageStore,
        outcome: Outcome,
        on_fragment: &mut impl FnMut(&str),
    ) -> SessionState {
        while !self.queue.is_empty() {
            self.apply_next(store, on_fragment);
        }

        let state = match outcome {
            Outcome::Completed => SessionState::Completed,
            Outcome::Cancelled => {
                if let Some(msg) = store.last_assistant_mut() {
                    if msg.content.is_empty() {
                        msg.content.push_str(STOPPED_MARKER);
                    }
                }
                tracing::info!("chat stream cancelled by user");
                SessionState::Cancelled
            }
            Outcome::Errored(detail) => {
                if let Some(msg) = store.last_assistant_mut() {
                    msg.content = format!("{ERROR_PREFIX}{detail}");
                }
                tracing::error!("chat stream failed: {detail}");
                SessionState::Errored
            }
        };
        self.state = state;
        state
    }
}

/// Client for the streaming `rag/chat` endpoint.
///
/// One instance serves any number of sequential sessions. Concurrent
/// sessions against the same [`MessageStore`] are ruled out by the `&mut`
/// borrow [`send`](Self::send) takes for the session's whole lifetime.
#[derive(Debug, Clone)]
pub struct StreamingChatClient {
    http: reqwest::Client,
    base_url: Url,
    pacing_interval: Duration,
    idle_timeout: Duration,
}

impl StreamingChatClient {
    /// Create a client from the API and chat configuration sections.
    ///
    /// The underlying HTTP client gets a connect timeout but no total
    /// request timeout: the stream may legitimately stay open for a long
    /// answer, and a hung connection is caught by the idle timeout instead.
    ///
    /// # Errors
    ///
    /// Returns [`IbotError::Config`] if the base URL does not parse.
    pub fn new(api: &ApiConfig, chat: &ChatConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(api.connect_timeout_seconds))
            .user_agent(format!("ibot/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: api.base_url()?,
            pacing_interval: Duration::from_millis(chat.pacing_interval_ms),
            idle_timeout: Duration::from_secs(chat.stream_idle_timeout_seconds),
        })
    }

    /// Issue one chat query and stream the answer into `store`.
    ///
    /// Appends a user message and an empty assistant message, POSTs
    /// `{knowledge_base_id, query, k}`, and consumes the event stream,
    /// applying token fragments under pacing. `on_fragment` is called once
    /// per applied fragment, in arrival order, for incremental display.
    ///
    /// Cancelling `cancel` stops the session cooperatively: partial content
    /// is kept, an empty message gets [`STOPPED_MARKER`].
    ///
    /// # Errors
    ///
    /// Returns [`IbotError::Precondition`] when the trimmed query is empty
    /// or the knowledge base id is not positive; nothing is appended and no
    /// request is issued. Transport failures and server-signaled errors do
    /// NOT return `Err`: they are surfaced as prefixed assistant-message
    /// content and reported through the returned terminal state.
    pub async fn send(
        &self,
        store: &mut MessageStore,
        query: &str,
        knowledge_base_id: i64,
        top_k: u32,
        cancel: CancellationToken,
        mut on_fragment: impl FnMut(&str),
    ) -> Result<SessionState> {
        let query = query.trim();
        if query.is_empty() {
            return Err(IbotError::Precondition("query must not be empty".to_string()).into());
        }
        if knowledge_base_id <= 0 {
            return Err(IbotError::Precondition("no knowledge base selected".to_string()).into());
        }

        store.push(ChatMessage::user(query));
        store.push(ChatMessage::assistant());

        let mut session = StreamSession::new();
        tracing::debug!(knowledge_base_id, top_k, "issuing chat request");

        let url = self
            .base_url
            .join("rag/chat")
            .map_err(|e| IbotError::Config(format!("invalid chat endpoint: {e}")))?;

        let response = match self
            .http
            .post(url)
            .json(&ChatRequest {
                knowledge_base_id,
                query,
                k: top_k,
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let outcome = Outcome::Errored(format!("request failed: {e}"));
                return Ok(session.finalize(store, outcome, &mut on_fragment));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let outcome = Outcome::Errored(format!("HTTP {status}: {body}"));
            return Ok(session.finalize(store, outcome, &mut on_fragment));
        }

        let outcome = self
            .consume(
                &mut session,
                store,
                response.bytes_stream(),
                &cancel,
                &mut on_fragment,
            )
            .await;
        Ok(session.finalize(store, outcome, &mut on_fragment))
    }

    /// Consume the response byte stream until it ends, errors, or the
    /// session is cancelled.
    ///
    /// Frames are delimited by a blank line. The (possibly incomplete) tail
    /// after the last delimiter is retained across reads and prefixed to the
    /// next chunk, so a frame split at any byte boundary reassembles intact.
    /// The buffer holds raw bytes: multi-byte characters may also split
    /// across chunks, and only complete frames are decoded as UTF-8.
    async fn consume<S>(
        &self,
        session: &mut StreamSession,
        store: &mut MessageStore,
        byte_stream: S,
        cancel: &CancellationToken,
        on_fragment: &mut impl FnMut(&str),
    ) -> Outcome
    where
        S: Stream<Item = reqwest::Result<Bytes>>,
    {
        let mut buffer: Vec<u8> = Vec::new();
        tokio::pin!(byte_stream);

        let mut pacing = interval(self.pacing_interval);
        pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let idle = sleep(self.idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return Outcome::Cancelled;
                }

                _ = pacing.tick(), if !session.queue.is_empty() => {
                    session.apply_next(store, on_fragment);
                }

                maybe_chunk = byte_stream.next() => {
                    match maybe_chunk {
                        Some(Ok(chunk)) => {
                            session.state = SessionState::Streaming;
                            idle.as_mut().reset(Instant::now() + self.idle_timeout);
                            buffer.extend_from_slice(&chunk);

                            while let Some(pos) = find_delimiter(&buffer) {
                                let rest = buffer.split_off(pos + EVENT_DELIMITER.len());
                                let frame = String::from_utf8_lossy(&buffer[..pos]).into_owned();
                                buffer = rest;

                                if let Some(error) = session.handle_frame(&frame, store) {
                                    return Outcome::Errored(error);
                                }
                            }
                        }
                        Some(Err(e)) => {
                            return Outcome::Errored(format!("stream read failed: {e}"));
                        }
                        None => {
                            // The server may close without a trailing delimiter;
                            // the residue is still one whole frame.
                            if !buffer.is_empty() {
                                let frame = String::from_utf8_lossy(&buffer).into_owned();
                                if let Some(error) = session.handle_frame(&frame, store) {
                                    return Outcome::Errored(error);
                                }
                            }
                            return Outcome::Completed;
                        }
                    }
                }

                _ = &mut idle => {
                    return Outcome::Errored(format!(
                        "no data received for {}s",
                        self.idle_timeout.as_secs()
                    ));
                }
            }
        }
    }
}

/// Position of the first frame delimiter in the buffer, if any.
fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(EVENT_DELIMITER.len())
        .position(|w| w == EVENT_DELIMITER)
}
