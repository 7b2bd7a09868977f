use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::demo::DemoResponder;
use crate::transcript::{Message, Transcript};
use crate::transport::{HttpRequest, Transport, TransportError};

/// Returned when the endpoint answers without any message content.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "Keine Antwort erhalten.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "Du bist ein freundlicher und hilfreicher KI-Assistent für eine Website.

Deine Aufgaben:
- Beantworte Fragen der Besucher höflich und kompetent
- Hilf bei der Navigation auf der Website
- Beantworte allgemeine Fragen zu den angebotenen Services
- Leite bei komplexen Anfragen zum Kontaktformular weiter

Verhaltensregeln:
- Antworte immer auf Deutsch
- Sei freundlich und professionell
- Halte Antworten kurz und prägnant
- Bei Unsicherheit, empfehle das Kontaktformular";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("completion endpoint returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed completion response: {0}")]
    MalformedBody(#[source] serde_json::Error),
}

/// Generation parameters and endpoint for live mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    /// `None` routes every message to the demo responder.
    pub credential: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatSettings {
    pub fn is_live(&self) -> bool {
        self.credential
            .as_deref()
            .and_then(siteconfig::usable_key)
            .is_some()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Conversational session bound to one transcript.
///
/// Each call to [`ChatClient::send_message`] records the user turn before any
/// network activity and the assistant turn only once a reply exists. Failed
/// calls therefore leave a dangling user turn behind.
pub struct ChatClient<T> {
    transport: T,
    settings: ChatSettings,
    system_prompt: Message,
    demo: DemoResponder,
    transcript: Transcript,
}

impl<T: Transport> ChatClient<T> {
    pub fn new(transport: T, settings: ChatSettings) -> Self {
        if !settings.is_live() {
            warn!("no API key configured; answering in demo mode");
        }
        Self {
            transport,
            settings,
            system_prompt: Message::system(DEFAULT_SYSTEM_PROMPT),
            demo: DemoResponder::default(),
            transcript: Transcript::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Message::system(prompt);
        self
    }

    pub fn with_demo_responder(mut self, demo: DemoResponder) -> Self {
        self.demo = demo;
        self
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn clear_history(&mut self) {
        self.transcript.clear();
    }

    pub fn send_message(&mut self, text: &str) -> Result<String, ChatError> {
        self.transcript.push(Message::user(text));

        let reply = match self.request_reply(text) {
            Ok(reply) => reply,
            Err(err) => {
                error!(error = %err, "chat request failed");
                return Err(err);
            }
        };

        self.transcript.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    fn request_reply(&self, text: &str) -> Result<String, ChatError> {
        if !self.settings.is_live() {
            debug!("demo mode reply");
            return Ok(self.demo.reply(text).to_string());
        }
        let credential = self.settings.credential.as_deref().unwrap_or_default();

        let messages = std::iter::once(&self.system_prompt)
            .chain(self.transcript.iter())
            .collect();
        let payload = CompletionRequest {
            model: &self.settings.model,
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };
        let body = serde_json::to_value(&payload).map_err(ChatError::MalformedBody)?;
        let request = HttpRequest {
            url: self.settings.endpoint.clone(),
            bearer: credential.trim().to_string(),
            body,
        };

        let response = self.transport.post_json(&request)?;
        debug!(status = response.status, "completion endpoint responded");
        if !response.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&response.body)
                .ok()
                .and_then(|envelope| envelope.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ChatError::Status {
                status: response.status,
                message,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&response.body).map_err(ChatError::MalformedBody)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY_PLACEHOLDER.to_string());
        Ok(content)
    }
}
