//! Conversational session client for the site assistant.
//!
//! [`ChatClient`] owns the transcript and turns each user message into one
//! request against an OpenAI-style `chat/completions` endpoint. Without a
//! usable credential it never touches the network and answers from the
//! keyword table in [`DemoResponder`].

mod client;
mod demo;
mod transcript;
mod transport;

pub use client::{
    ChatClient, ChatError, ChatSettings, DEFAULT_SYSTEM_PROMPT, EMPTY_REPLY_PLACEHOLDER,
};
pub use demo::DemoResponder;
pub use transcript::{Message, Role, Transcript};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport, TransportError};
