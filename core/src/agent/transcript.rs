use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File extensions accepted for diagram attachments.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Maps an attachment extension onto the wire format. Only the closed set
    /// in [`SUPPORTED_IMAGE_EXTENSIONS`] resolves.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub format: ImageFormat,
    pub source: ImageSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUseBlock {
    pub tool_use_id: String,
    pub name: String,
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolResultContent {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    pub content: Vec<ToolResultContent>,
}

/// One block of message content. Serializes to the Converse shape, e.g.
/// `{"text": "..."}` or `{"toolUse": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlock {
    Text(String),
    Image(ImageBlock),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
}

/// Output of one tool invocation, addressed to the tool use that requested it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub tool_use_id: String,
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Image block first, then the text.
    pub fn user_image(text: impl Into<String>, bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            role: Role::User,
            content: vec![
                ContentBlock::Image(ImageBlock {
                    format,
                    source: ImageSource { bytes },
                }),
                ContentBlock::Text(text.into()),
            ],
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Wraps every output in its own tool result block, keeping the order in
    /// which the assistant asked for them.
    pub fn tool_results(results: Vec<ToolOutput>) -> Self {
        Self {
            role: Role::User,
            content: results.into_iter().map(tool_result_block).collect(),
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUseBlock> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        })
    }
}

fn tool_result_block(output: ToolOutput) -> ContentBlock {
    ContentBlock::ToolResult(ToolResultBlock {
        tool_use_id: output.tool_use_id,
        content: vec![ToolResultContent::Json(output.content)],
    })
}

/// Append-only conversation history for one session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends a new user turn. If the previous turn stopped while tool uses
    /// were still unanswered, error results for them are placed in front of
    /// the user's content so the protocol sees every tool use answered. A
    /// user message that never got a reply absorbs the new content instead
    /// of being followed by a second user message.
    pub fn push_user(&mut self, mut message: Message) {
        let pending: Vec<ContentBlock> = self
            .pending_tool_uses()
            .map(|tool_use| {
                tool_result_block(ToolOutput {
                    tool_use_id: tool_use.tool_use_id.clone(),
                    content: crate::agent::registry::error_payload(
                        "The tool was not run because the previous turn was stopped.",
                    ),
                })
            })
            .collect();

        if !pending.is_empty() {
            message.content.splice(0..0, pending);
        }

        match self.messages.last_mut() {
            Some(last) if last.role == Role::User => last.content.extend(message.content),
            _ => self.messages.push(message),
        }
    }

    /// Tool uses of the last assistant message that have no result yet.
    pub fn pending_tool_uses(&self) -> impl Iterator<Item = &ToolUseBlock> {
        self.messages
            .last()
            .filter(|m| m.role == Role::Assistant)
            .into_iter()
            .flat_map(|m| m.tool_uses())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
