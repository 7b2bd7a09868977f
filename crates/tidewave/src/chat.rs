use std::io::{self, BufRead, Write};

use chat::{ChatClient, Transport};
use siteconfig::ChatMessages;

const CLEAR_COMMAND: &str = "/clear";
const OPEN_COMMAND: &str = "/open";
const CLOSE_COMMAND: &str = "/close";
const QUIT_COMMAND: &str = "/quit";

/// Terminal rendition of the floating chat widget.
///
/// Owns its client and its open flag; the REPL in [`run_repl`] is the only
/// thing that drives it.
pub struct ChatWidget<T> {
    client: ChatClient<T>,
    messages: ChatMessages,
    max_message_length: usize,
    open: bool,
}

/// What a single line of input amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Cleared,
    Opened,
    Closed,
    Quit,
    /// Input exceeded the configured length and was not sent.
    Rejected,
    /// Widget is closed; the message was not sent.
    Hidden,
    Replied(String),
    Failed,
}

impl<T: Transport> ChatWidget<T> {
    pub fn new(client: ChatClient<T>, messages: ChatMessages, max_message_length: usize) -> Self {
        Self {
            client,
            messages,
            max_message_length,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens the widget, greeting the user the first time.
    pub fn open<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.open {
            return Ok(());
        }
        self.open = true;
        if self.client.transcript().is_empty() {
            writeln!(out, "Bot: {}", self.messages.welcome)?;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle<W: Write>(&mut self, out: &mut W) -> io::Result<bool> {
        if self.open {
            self.close();
        } else {
            self.open(out)?;
        }
        Ok(self.open)
    }

    pub fn transcript_len(&self) -> usize {
        self.client.transcript().len()
    }

    /// Handles one line of user input, writing whatever the widget would show.
    pub fn submit<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Outcome> {
        let input = line.trim();
        match input {
            "" => return Ok(Outcome::Ignored),
            QUIT_COMMAND => return Ok(Outcome::Quit),
            OPEN_COMMAND => {
                self.open(out)?;
                return Ok(Outcome::Opened);
            }
            CLOSE_COMMAND => {
                self.close();
                writeln!(out, "(chat closed; type {OPEN_COMMAND} to reopen)")?;
                return Ok(Outcome::Closed);
            }
            CLEAR_COMMAND => {
                self.client.clear_history();
                writeln!(out, "(history cleared)")?;
                return Ok(Outcome::Cleared);
            }
            _ => {}
        }

        if !self.open {
            writeln!(out, "(chat closed; type {OPEN_COMMAND} to reopen)")?;
            return Ok(Outcome::Hidden);
        }

        let length = input.chars().count();
        if length > self.max_message_length {
            tracing::info!(length, limit = self.max_message_length, "message too long");
            writeln!(
                out,
                "(message too long: {length} characters, limit is {})",
                self.max_message_length
            )?;
            return Ok(Outcome::Rejected);
        }

        writeln!(out, "{}", self.messages.typing)?;
        out.flush()?;

        match self.client.send_message(input) {
            Ok(reply) => {
                writeln!(out, "Bot: {reply}")?;
                Ok(Outcome::Replied(reply))
            }
            Err(err) => {
                tracing::error!(error = %err, "chat turn failed");
                writeln!(out, "Bot: {}", self.messages.error)?;
                Ok(Outcome::Failed)
            }
        }
    }
}

/// Reads lines from `input` until EOF or `/quit`.
pub fn run_repl<T, R, W>(widget: &mut ChatWidget<T>, input: R, out: &mut W) -> io::Result<()>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    widget.open(out)?;
    for line in input.lines() {
        let line = line?;
        if widget.submit(&line, out)? == Outcome::Quit {
            break;
        }
    }
    out.flush()
}
