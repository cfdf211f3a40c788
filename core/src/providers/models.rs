/// A model that supports tool use through the Converse API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub alias: &'static str,
    pub id: &'static str,
    pub label: &'static str,
}

pub const SUPPORTED_MODELS: &[ModelInfo] = &[
    ModelInfo {
        alias: "claude-3.5-sonnet",
        id: "anthropic.claude-3-5-sonnet-20240620-v1:0",
        label: "Claude 3.5 Sonnet",
    },
    ModelInfo {
        alias: "claude-3-opus",
        id: "anthropic.claude-3-opus-20240229-v1:0",
        label: "Claude 3 Opus",
    },
    ModelInfo {
        alias: "claude-3-sonnet",
        id: "anthropic.claude-3-sonnet-20240229-v1:0",
        label: "Claude 3 Sonnet",
    },
    ModelInfo {
        alias: "claude-3-haiku",
        id: "anthropic.claude-3-haiku-20240307-v1:0",
        label: "Claude 3 Haiku",
    },
    ModelInfo {
        alias: "command-r",
        id: "cohere.command-r-v1:0",
        label: "Cohere Command R",
    },
    ModelInfo {
        alias: "command-r-plus",
        id: "cohere.command-r-plus-v1:0",
        label: "Cohere Command R+",
    },
];

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";

/// Accepts either an alias from the catalog or a raw model id, which is
/// passed through untouched.
pub fn resolve_model_id(name: &str) -> String {
    let name = name.trim();
    SUPPORTED_MODELS
        .iter()
        .find(|m| m.alias.eq_ignore_ascii_case(name))
        .map(|m| m.id.to_string())
        .unwrap_or_else(|| name.to_string())
}

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    SUPPORTED_MODELS.iter().find(|m| m.id == id)
}
