use crate::agent::registry::ToolRegistry;
use crate::agent::transcript::{ContentBlock, Message, ToolOutput, Transcript};
use crate::error::GatewayError;
use crate::traits::{ConverseRequest, Gateway, StopReason};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RECURSIONS: usize = 5;

/// Progress reported while a turn runs, in the order it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    GatewayCall { model: String, messages: usize },
    ModelText(String),
    ToolUse { name: String, input: Value },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    RecursionLimit { limit: usize },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecursionLimit { limit } => write!(
                f,
                "Maximum number of recursions ({}) reached. Please try again.",
                limit
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model finished with `end_turn`.
    Completed { answer: String },
    /// The model stopped for a reason the loop does not act on.
    Stopped {
        stop_reason: StopReason,
        text: Option<String>,
    },
    Aborted(AbortReason),
}

/// Gateway calls left in the current turn.
#[derive(Debug, Clone, Copy)]
pub struct RecursionBudget {
    limit: usize,
    remaining: usize,
}

impl RecursionBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }

    pub fn consume(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

enum State {
    AwaitResponse,
    DispatchTools,
    Finished(TurnOutcome),
}

pub struct DispatchLoop {
    gateway: Arc<dyn Gateway>,
    tool_registry: Arc<ToolRegistry>,
    system_prompt: String,
    max_recursions: usize,
}

impl DispatchLoop {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        tool_registry: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            tool_registry,
            system_prompt: system_prompt.into(),
            max_recursions: DEFAULT_MAX_RECURSIONS,
        }
    }

    pub fn with_max_recursions(mut self, max: usize) -> Self {
        self.max_recursions = max;
        self
    }

    pub fn max_recursions(&self) -> usize {
        self.max_recursions
    }

    pub fn model_id(&self) -> &str {
        self.gateway.model_id()
    }

    /// Runs one user turn against a transcript that already ends with the
    /// user's message. Every gateway call of the turn draws on a fresh
    /// budget; the transcript only ever grows.
    pub async fn run_turn(
        &self,
        transcript: &mut Transcript,
        on_event: &mut dyn FnMut(TurnEvent),
    ) -> Result<TurnOutcome, GatewayError> {
        let tools = self.tool_registry.specs();
        let mut budget = RecursionBudget::new(self.max_recursions);
        let mut state = if budget.is_exhausted() {
            State::Finished(TurnOutcome::Aborted(AbortReason::RecursionLimit {
                limit: budget.limit(),
            }))
        } else {
            State::AwaitResponse
        };

        loop {
            state = match state {
                State::AwaitResponse => {
                    on_event(TurnEvent::GatewayCall {
                        model: self.gateway.model_id().to_string(),
                        messages: transcript.len(),
                    });

                    let request = ConverseRequest {
                        messages: transcript.messages(),
                        system: &self.system_prompt,
                        tools: if tools.is_empty() { None } else { Some(&tools) },
                    };
                    let response = self.gateway.send(request).await?;
                    budget.consume();

                    debug!(
                        stop_reason = %response.stop_reason,
                        remaining = budget.remaining(),
                        "Model responded"
                    );

                    let stop_reason = response.stop_reason;
                    transcript.push(response.message);
                    self.next_state(stop_reason, transcript, &budget)
                }
                State::DispatchTools => {
                    let outputs = match transcript.last() {
                        Some(message) => self.dispatch_tools(message, on_event).await,
                        None => Vec::new(),
                    };
                    transcript.push(Message::tool_results(outputs));
                    State::AwaitResponse
                }
                State::Finished(outcome) => return Ok(outcome),
            };
        }
    }

    fn next_state(
        &self,
        stop_reason: StopReason,
        transcript: &Transcript,
        budget: &RecursionBudget,
    ) -> State {
        let last = transcript.last();
        match stop_reason {
            StopReason::EndTurn => State::Finished(TurnOutcome::Completed {
                answer: last
                    .and_then(|m| m.first_text())
                    .unwrap_or_default()
                    .to_string(),
            }),
            StopReason::ToolUse if last.is_some_and(|m| m.tool_uses().next().is_some()) => {
                if budget.is_exhausted() {
                    warn!(
                        limit = budget.limit(),
                        "Maximum number of recursions reached, stopping turn"
                    );
                    State::Finished(TurnOutcome::Aborted(AbortReason::RecursionLimit {
                        limit: budget.limit(),
                    }))
                } else {
                    State::DispatchTools
                }
            }
            other => {
                warn!(stop_reason = %other, "Model stopped without a final answer");
                State::Finished(TurnOutcome::Stopped {
                    stop_reason: other,
                    text: last.and_then(|m| m.first_text()).map(str::to_string),
                })
            }
        }
    }

    /// Walks the assistant message in order: narration is reported as it
    /// appears, tool uses run one after another.
    async fn dispatch_tools(
        &self,
        message: &Message,
        on_event: &mut dyn FnMut(TurnEvent),
    ) -> Vec<ToolOutput> {
        let mut outputs = Vec::new();

        for block in &message.content {
            match block {
                ContentBlock::Text(text) => on_event(TurnEvent::ModelText(text.clone())),
                ContentBlock::ToolUse(tool_use) => {
                    on_event(TurnEvent::ToolUse {
                        name: tool_use.name.clone(),
                        input: tool_use.input.clone(),
                    });
                    let content = self
                        .tool_registry
                        .invoke(&tool_use.name, tool_use.input.clone())
                        .await;
                    outputs.push(ToolOutput {
                        tool_use_id: tool_use.tool_use_id.clone(),
                        content,
                    });
                }
                ContentBlock::Image(_) | ContentBlock::ToolResult(_) => {}
            }
        }

        outputs
    }
}
