//! Chat transcript state machine.
//!
//! A transcript owns the ordered message list of one chat view and the
//! explicit phase of its single in-flight exchange. The streaming
//! consumer drives the phase only through the transitions below; the
//! phase is never inferred from ad hoc flags.
//!
//! Invariant: while an exchange is streaming, the transcript ends in
//! exactly one assistant message whose text grows in place as chunks
//! arrive. Chunks are never duplicated into new messages.

use serde::{Deserialize, Serialize};

use crate::error::{DishaError, Result};

/// Shown in place of an assistant reply when the exchange fails.
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble connecting to the brain.";

/// Which side of the conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub origin: Origin,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Assistant,
            text: text.into(),
        }
    }
}

/// Lifecycle of one exchange with the chat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangePhase {
    #[default]
    Idle,
    Sending,
    Streaming,
    SettledOk,
    SettledError,
}

impl ExchangePhase {
    /// True while an exchange owns the trailing assistant message.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Sending | Self::Streaming)
    }
}

/// Ordered message list plus the phase of the current exchange.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    phase: ExchangePhase,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript seeded with an assistant greeting, the way
    /// a fresh chat window opens.
    pub fn with_greeting(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(text)],
            phase: ExchangePhase::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    /// Text of the trailing assistant message, if the transcript ends
    /// with one.
    pub fn last_assistant_text(&self) -> Option<&str> {
        match self.messages.last() {
            Some(msg) if msg.origin == Origin::Assistant => Some(&msg.text),
            _ => None,
        }
    }

    /// Appends the user's prompt and moves to `Sending`.
    ///
    /// Rejects with [`DishaError::Busy`] while a previous exchange is
    /// still in flight, so at most one exchange owns the trailing
    /// assistant message at a time.
    pub fn begin_send(&mut self, prompt: &str) -> Result<()> {
        if self.phase.is_in_flight() {
            return Err(DishaError::busy("a chat exchange is already streaming"));
        }
        self.messages.push(Message::user(prompt));
        self.phase = ExchangePhase::Sending;
        Ok(())
    }

    /// Appends the empty assistant placeholder and moves to
    /// `Streaming`. Called exactly once per exchange, on the first
    /// byte of a successful response, before any chunk is applied.
    pub fn begin_streaming(&mut self) -> Result<()> {
        if self.phase != ExchangePhase::Sending {
            return Err(DishaError::internal(format!(
                "begin_streaming from phase {:?}",
                self.phase
            )));
        }
        self.messages.push(Message::assistant(""));
        self.phase = ExchangePhase::Streaming;
        Ok(())
    }

    /// Appends one decoded chunk to the placeholder, in arrival order,
    /// and returns the full accumulated text so subscribers can simply
    /// replace their view of the last message.
    pub fn apply_chunk(&mut self, chunk: &str) -> Result<&str> {
        if self.phase != ExchangePhase::Streaming {
            return Err(DishaError::internal(format!(
                "apply_chunk from phase {:?}",
                self.phase
            )));
        }
        // begin_streaming guarantees the trailing assistant message.
        let last = self
            .messages
            .last_mut()
            .ok_or_else(|| DishaError::internal("streaming transcript has no messages"))?;
        last.text.push_str(chunk);
        Ok(&last.text)
    }

    /// Marks the exchange settled after the stream ended cleanly. A
    /// stream that delivered zero chunks settles from `Sending` with
    /// no placeholder ever appended.
    pub fn settle_ok(&mut self) {
        self.phase = ExchangePhase::SettledOk;
    }

    /// Marks the exchange failed and pins the fallback reply as the
    /// trailing assistant text, overwriting a partial placeholder or
    /// appending one if the failure happened before streaming began.
    /// No-op unless an exchange is in flight, so a settled reply or
    /// the greeting is never overwritten retroactively.
    pub fn settle_error(&mut self) {
        if !self.phase.is_in_flight() {
            return;
        }
        match self.messages.last_mut() {
            Some(msg) if msg.origin == Origin::Assistant => {
                msg.text = FALLBACK_REPLY.to_string();
            }
            _ => self.messages.push(Message::assistant(FALLBACK_REPLY)),
        }
        self.phase = ExchangePhase::SettledError;
    }

    /// Releases a cancelled exchange so a new send may start. Text
    /// already applied stays in place.
    pub fn release(&mut self) {
        if self.phase.is_in_flight() {
            self.phase = ExchangePhase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_accumulate_into_one_trailing_assistant_message() {
        let mut transcript = Transcript::new();
        transcript.begin_send("tell me about placements").unwrap();
        transcript.begin_streaming().unwrap();

        assert_eq!(transcript.apply_chunk("Hel").unwrap(), "Hel");
        assert_eq!(transcript.apply_chunk("lo").unwrap(), "Hello");
        assert_eq!(transcript.apply_chunk(" World").unwrap(), "Hello World");
        transcript.settle_ok();

        let assistant: Vec<_> = transcript
            .messages()
            .iter()
            .filter(|m| m.origin == Origin::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].text, "Hello World");
        assert_eq!(transcript.phase(), ExchangePhase::SettledOk);
    }

    #[test]
    fn second_send_is_rejected_while_in_flight() {
        let mut transcript = Transcript::new();
        transcript.begin_send("first").unwrap();
        let err = transcript.begin_send("second").unwrap_err();
        assert!(err.is_busy());
        // The rejected prompt left no trace.
        assert_eq!(transcript.messages().len(), 1);

        transcript.begin_streaming().unwrap();
        assert!(transcript.begin_send("third").unwrap_err().is_busy());
    }

    #[test]
    fn settle_error_overwrites_partial_placeholder() {
        let mut transcript = Transcript::new();
        transcript.begin_send("hi").unwrap();
        transcript.begin_streaming().unwrap();
        transcript.apply_chunk("partial ans").unwrap();

        transcript.settle_error();
        assert_eq!(transcript.last_assistant_text(), Some(FALLBACK_REPLY));
        assert_eq!(transcript.phase(), ExchangePhase::SettledError);
    }

    #[test]
    fn settle_error_before_streaming_appends_fallback() {
        let mut transcript = Transcript::new();
        transcript.begin_send("hi").unwrap();

        transcript.settle_error();
        assert_eq!(transcript.messages().len(), 2);
        assert_eq!(transcript.last_assistant_text(), Some(FALLBACK_REPLY));
    }

    #[test]
    fn settle_error_never_touches_a_settled_transcript() {
        let mut transcript = Transcript::with_greeting("Hello! Ask me anything.");
        transcript.settle_error();
        assert_eq!(transcript.phase(), ExchangePhase::Idle);
        assert_eq!(
            transcript.last_assistant_text(),
            Some("Hello! Ask me anything.")
        );

        transcript.begin_send("hi").unwrap();
        transcript.begin_streaming().unwrap();
        transcript.apply_chunk("answer").unwrap();
        transcript.settle_ok();

        transcript.settle_error();
        assert_eq!(transcript.phase(), ExchangePhase::SettledOk);
        assert_eq!(transcript.last_assistant_text(), Some("answer"));
    }

    #[test]
    fn settled_exchange_frees_the_transcript_for_the_next_send() {
        let mut transcript = Transcript::with_greeting("Hello! Ask me anything.");
        transcript.begin_send("one").unwrap();
        transcript.begin_streaming().unwrap();
        transcript.settle_ok();

        transcript.begin_send("two").unwrap();
        assert_eq!(transcript.phase(), ExchangePhase::Sending);
        // greeting + user + placeholder + user
        assert_eq!(transcript.messages().len(), 4);
    }

    #[test]
    fn release_keeps_applied_text() {
        let mut transcript = Transcript::new();
        transcript.begin_send("hi").unwrap();
        transcript.begin_streaming().unwrap();
        transcript.apply_chunk("partial").unwrap();

        transcript.release();
        assert_eq!(transcript.phase(), ExchangePhase::Idle);
        assert_eq!(transcript.last_assistant_text(), Some("partial"));
        transcript.begin_send("next").unwrap();
    }

    #[test]
    fn begin_streaming_requires_sending_phase() {
        let mut transcript = Transcript::new();
        assert!(transcript.begin_streaming().is_err());
        assert!(transcript.apply_chunk("x").is_err());
    }
}
