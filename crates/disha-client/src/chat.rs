//! Streaming chat consumer.
//!
//! `ChatExchange` drives one request/response cycle with the chat
//! endpoint: it appends the user's prompt, reads the chunked response
//! body incrementally, grows the trailing assistant message in place,
//! and republishes the accumulated text to its subscriber after every
//! chunk. Transport failures settle into a fixed fallback reply; the
//! caller never needs to catch anything.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use disha_core::error::{DishaError, Result};
use disha_core::transcript::{ExchangePhase, Transcript};

/// Incremental byte stream of one chat response body.
pub type ChunkStream = BoxStream<'static, Result<Bytes>>;

/// Seam between the consumer and the wire. Implemented over
/// `POST /chat` by `PortalApi`, and by in-memory fakes in tests.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Opens the exchange and returns its response body as a stream of
    /// chunks. Errors here mean the exchange never produced a byte.
    async fn open(&self, query: &str) -> Result<ChunkStream>;
}

/// What the chat view observes while an exchange runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Full accumulated assistant text after one more chunk. The
    /// subscriber replaces its view of the last message with this.
    Update(String),
    /// The stream ended cleanly.
    Done,
    /// The exchange failed; the transcript now ends in the fallback
    /// reply.
    Error(String),
}

/// Cancels one in-flight exchange.
///
/// Cancelling stops further chunk application and suppresses
/// `Update`/`Done` events for that exchange. Text already applied
/// stays in the transcript. Must be invoked when the owning view is
/// torn down.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Owns one chat view's transcript and serializes its exchanges.
pub struct ChatExchange {
    transport: Arc<dyn ChatTransport>,
    transcript: Arc<Mutex<Transcript>>,
    events: mpsc::UnboundedSender<ChatEvent>,
}

impl ChatExchange {
    /// Creates an exchange over the given transport, returning the
    /// event receiver the chat view subscribes to.
    pub fn new(
        transport: Arc<dyn ChatTransport>,
    ) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        Self::with_transcript(transport, Transcript::new())
    }

    /// Like [`ChatExchange::new`] but seeds the transcript, e.g. with
    /// the assistant's greeting.
    pub fn with_transcript(
        transport: Arc<dyn ChatTransport>,
        transcript: Transcript,
    ) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            Self {
                transport,
                transcript: Arc::new(Mutex::new(transcript)),
                events,
            },
            receiver,
        )
    }

    /// Snapshot of the transcript as it stands right now.
    pub fn transcript(&self) -> Transcript {
        lock(&self.transcript).clone()
    }

    /// Submits a prompt and drives the exchange to settlement in a
    /// background task.
    ///
    /// Rejects immediately, with no network call and no state change,
    /// when the prompt is empty or whitespace-only
    /// ([`DishaError::Validation`]) or when a previous exchange is
    /// still in flight ([`DishaError::Busy`]). On acceptance the user
    /// message is already in the transcript when this returns.
    pub fn send(&self, prompt: &str) -> Result<CancelHandle> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(DishaError::validation("prompt must not be empty"));
        }

        lock(&self.transcript).begin_send(prompt)?;

        let token = CancellationToken::new();
        tokio::spawn(run_exchange(
            self.transport.clone(),
            self.transcript.clone(),
            self.events.clone(),
            token.clone(),
            prompt.to_string(),
        ));
        Ok(CancelHandle { token })
    }
}

fn lock(transcript: &Arc<Mutex<Transcript>>) -> MutexGuard<'_, Transcript> {
    transcript.lock().expect("transcript mutex poisoned")
}

/// Incremental UTF-8 decoder for the response body.
///
/// A multibyte code point may arrive split across network chunks;
/// trailing incomplete bytes are held back and prefixed onto the next
/// chunk, so accumulated text never grows replacement characters at
/// chunk boundaries. Genuinely invalid bytes decode to the
/// replacement character, as a lossy decode would.
struct StreamDecoder {
    carry: Vec<u8>,
}

impl StreamDecoder {
    fn new() -> Self {
        Self { carry: Vec::new() }
    }

    fn decode(&mut self, bytes: &[u8]) -> String {
        self.carry.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.carry) {
                Ok(text) => {
                    out.push_str(text);
                    self.carry.clear();
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.carry[..valid]));
                    match err.error_len() {
                        // Incomplete trailing sequence: hold it back
                        // for the next chunk.
                        None => {
                            self.carry.drain(..valid);
                            return out;
                        }
                        Some(skip) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.carry.drain(..valid + skip);
                        }
                    }
                }
            }
        }
    }

    /// Decodes whatever is still held back once the stream ends. A
    /// stream truncated mid-sequence yields replacement characters.
    fn flush(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        tail
    }
}

/// One exchange from request to settlement. The transcript lock is
/// never held across an await, so UI readers always observe whole
/// chunks.
async fn run_exchange(
    transport: Arc<dyn ChatTransport>,
    transcript: Arc<Mutex<Transcript>>,
    events: mpsc::UnboundedSender<ChatEvent>,
    token: CancellationToken,
    prompt: String,
) {
    let mut stream = tokio::select! {
        biased;
        _ = token.cancelled() => {
            lock(&transcript).release();
            return;
        }
        opened = transport.open(&prompt) => match opened {
            Ok(stream) => stream,
            Err(err) => {
                settle_failed(&transcript, &events, err.to_string());
                return;
            }
        },
    };

    let mut decoder = StreamDecoder::new();
    loop {
        let chunk = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("[ChatExchange] cancelled mid-stream");
                lock(&transcript).release();
                return;
            }
            chunk = stream.next() => chunk,
        };

        match chunk {
            None => break,
            Some(Err(err)) => {
                settle_failed(&transcript, &events, err.to_string());
                return;
            }
            Some(Ok(bytes)) => {
                let text = decoder.decode(&bytes);
                match apply_text(&transcript, &text) {
                    Ok(full_text) => {
                        let _ = events.send(ChatEvent::Update(full_text));
                    }
                    Err(err) => {
                        settle_failed(&transcript, &events, err.to_string());
                        return;
                    }
                }
            }
        }
    }

    // A stream cut off mid-sequence still surfaces its held-back tail.
    let tail = decoder.flush();
    if !tail.is_empty() {
        match apply_text(&transcript, &tail) {
            Ok(full_text) => {
                let _ = events.send(ChatEvent::Update(full_text));
            }
            Err(err) => {
                settle_failed(&transcript, &events, err.to_string());
                return;
            }
        }
    }

    lock(&transcript).settle_ok();
    let _ = events.send(ChatEvent::Done);
}

/// Applies one decoded chunk, appending the assistant placeholder
/// first if this is the response's first byte.
fn apply_text(transcript: &Arc<Mutex<Transcript>>, text: &str) -> Result<String> {
    let mut guard = lock(transcript);
    if guard.phase() == ExchangePhase::Sending {
        guard.begin_streaming()?;
    }
    guard.apply_chunk(text).map(str::to_string)
}

fn settle_failed(
    transcript: &Arc<Mutex<Transcript>>,
    events: &mpsc::UnboundedSender<ChatEvent>,
    reason: String,
) {
    tracing::warn!("[ChatExchange] exchange failed: {reason}");
    lock(transcript).settle_error();
    let _ = events.send(ChatEvent::Error(reason));
}
