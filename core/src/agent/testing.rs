use crate::agent::transcript::{ContentBlock, Message, Role, ToolUseBlock};
use crate::error::GatewayError;
use crate::traits::{ConverseRequest, ConverseResponse, Gateway, StopReason};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Gateway double that replays canned responses and records what it was sent.
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<ConverseResponse>>,
    repeat: Option<ConverseResponse>,
    pub calls: Mutex<Vec<SentRequest>>,
}

#[derive(Debug, Clone)]
pub struct SentRequest {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

impl ScriptedGateway {
    pub fn new(responses: Vec<ConverseResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the same response forever.
    pub fn repeating(response: ConverseResponse) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat: Some(response),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: ConverseRequest<'_>) -> Result<ConverseResponse, GatewayError> {
        self.calls.lock().unwrap().push(SentRequest {
            messages: request.messages.to_vec(),
            tool_names: request
                .tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
        });

        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return Ok(response);
        }
        self.repeat
            .clone()
            .ok_or_else(|| GatewayError::Malformed("script exhausted".into()))
    }
}

pub fn end_turn(text: &str) -> ConverseResponse {
    ConverseResponse {
        stop_reason: StopReason::EndTurn,
        message: Message::assistant_text(text),
        usage: None,
    }
}

pub fn tool_use(blocks: Vec<ContentBlock>) -> ConverseResponse {
    ConverseResponse {
        stop_reason: StopReason::ToolUse,
        message: Message {
            role: Role::Assistant,
            content: blocks,
        },
        usage: None,
    }
}

pub fn tool_call(id: &str, name: &str, input: Value) -> ContentBlock {
    ContentBlock::ToolUse(ToolUseBlock {
        tool_use_id: id.into(),
        name: name.into(),
        input,
    })
}
