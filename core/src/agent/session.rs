use crate::agent::attachment::Attachment;
use crate::agent::dispatch::{DispatchLoop, TurnEvent, TurnOutcome};
use crate::agent::transcript::{Message, Transcript};
use crate::error::SessionError;
use std::path::{Path, PathBuf};

/// What the user typed at a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Exit,
    Empty,
    Query(String),
}

impl UserInput {
    pub const EXIT_SENTINEL: &'static str = "x";

    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else if trimmed.eq_ignore_ascii_case(Self::EXIT_SENTINEL) {
            Self::Exit
        } else {
            Self::Query(trimmed.to_string())
        }
    }
}

/// One conversation: owns the transcript and hands each query to the
/// dispatch loop.
pub struct Session {
    dispatcher: DispatchLoop,
    transcript: Transcript,
    data_dir: PathBuf,
    pending_attachment: Option<String>,
}

impl Session {
    pub fn new(dispatcher: DispatchLoop, data_dir: impl AsRef<Path>) -> Self {
        Self {
            dispatcher,
            transcript: Transcript::new(),
            data_dir: data_dir.as_ref().to_path_buf(),
            pending_attachment: None,
        }
    }

    /// Queues an image for the next query. It is sent once and then dropped.
    pub fn attach(&mut self, file_name: impl Into<String>) {
        self.pending_attachment = Some(file_name.into());
    }

    pub fn has_pending_attachment(&self) -> bool {
        self.pending_attachment.is_some()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn dispatcher(&self) -> &DispatchLoop {
        &self.dispatcher
    }

    /// Runs one user turn. A rejected attachment aborts the turn before the
    /// transcript or the gateway are touched; the session stays usable.
    pub async fn submit(
        &mut self,
        query: &str,
        on_event: &mut dyn FnMut(TurnEvent),
    ) -> Result<TurnOutcome, SessionError> {
        let message = match self.pending_attachment.take() {
            Some(file_name) => {
                let attachment = Attachment::load(&self.data_dir, &file_name).await?;
                Message::user_image(
                    format!("Referencing {}, {}", attachment.display_path(), query),
                    attachment.bytes,
                    attachment.format,
                )
            }
            None => Message::user_text(query),
        };

        self.transcript.push_user(message);
        let outcome = self
            .dispatcher
            .run_turn(&mut self.transcript, on_event)
            .await?;
        Ok(outcome)
    }
}
