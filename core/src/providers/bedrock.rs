use crate::agent::transcript::Message;
use crate::error::GatewayError;
use crate::providers::sigv4::SigV4Signer;
use crate::traits::{ConverseRequest, ConverseResponse, Gateway, StopReason, TokenUsage, ToolSpec};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SIGNING_SERVICE: &str = "bedrock";
const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseBody<'a> {
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<SystemBlock<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inference_config: Option<InferenceConfig>,
}

#[derive(Debug, Serialize)]
struct SystemBlock<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ToolConfig<'a> {
    tools: Vec<ToolEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolEntry<'a> {
    tool_spec: BedrockToolSpec<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BedrockToolSpec<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: InputSchema<'a>,
}

#[derive(Debug, Serialize)]
struct InputSchema<'a> {
    json: &'a serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl InferenceConfig {
    fn is_empty(&self) -> bool {
        self.max_tokens.is_none() && self.temperature.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseOutput {
    output: OutputMessage,
    stop_reason: StopReason,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct OutputMessage {
    message: Message,
}

/// Amazon Bedrock Converse API over plain HTTPS with SigV4 signing.
pub struct BedrockGateway {
    client: reqwest::Client,
    signer: SigV4Signer,
    model_id: String,
    endpoint: String,
    inference: InferenceConfig,
}

impl BedrockGateway {
    pub fn new(signer: SigV4Signer, model_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        let endpoint = format!("https://bedrock-runtime.{}.amazonaws.com", signer.region());

        Self {
            client,
            signer,
            model_id: model_id.into(),
            endpoint,
            inference: InferenceConfig::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_inference_config(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    pub fn signing_service() -> &'static str {
        SIGNING_SERVICE
    }

    fn converse_url(&self) -> Result<Url, GatewayError> {
        let url = format!(
            "{}/model/{}/converse",
            self.endpoint,
            urlencoding::encode(&self.model_id)
        );
        Url::parse(&url).map_err(|e| GatewayError::Signing(format!("invalid endpoint {url}: {e}")))
    }

    fn build_body<'a>(&self, request: &ConverseRequest<'a>) -> ConverseBody<'a> {
        let system = if request.system.trim().is_empty() {
            Vec::new()
        } else {
            vec![SystemBlock {
                text: request.system,
            }]
        };

        ConverseBody {
            messages: request.messages,
            system,
            tool_config: request
                .tools
                .filter(|t| !t.is_empty())
                .map(|tools| ToolConfig {
                    tools: tools.iter().map(convert_tool).collect(),
                }),
            inference_config: (!self.inference.is_empty()).then_some(self.inference),
        }
    }
}

fn convert_tool(tool: &ToolSpec) -> ToolEntry<'_> {
    ToolEntry {
        tool_spec: BedrockToolSpec {
            name: &tool.name,
            description: &tool.description,
            input_schema: InputSchema {
                json: &tool.input_schema,
            },
        },
    }
}

pub(crate) fn classify_failure(status: StatusCode, body: String) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("ThrottlingException") {
        GatewayError::Throttled(body)
    } else {
        GatewayError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

fn parse_response(bytes: &[u8]) -> Result<ConverseResponse, GatewayError> {
    let output: ConverseOutput =
        serde_json::from_slice(bytes).map_err(|e| GatewayError::Malformed(e.to_string()))?;

    Ok(ConverseResponse {
        stop_reason: output.stop_reason,
        message: output.output.message,
        usage: output.usage,
    })
}

#[async_trait]
impl Gateway for BedrockGateway {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn send(&self, request: ConverseRequest<'_>) -> Result<ConverseResponse, GatewayError> {
        let url = self.converse_url()?;
        let body = serde_json::to_vec(&self.build_body(&request))
            .map_err(|e| GatewayError::Malformed(format!("could not encode request: {e}")))?;
        let headers = self
            .signer
            .sign("POST", &url, CONTENT_TYPE, &body, chrono::Utc::now())?;

        debug!(
            model = %self.model_id,
            messages = request.messages.len(),
            bytes = body.len(),
            "Calling Converse"
        );

        let mut builder = self
            .client
            .post(url)
            .header("content-type", CONTENT_TYPE)
            .header("accept", CONTENT_TYPE);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, error_text));
        }

        let bytes = response.bytes().await?;
        let parsed = parse_response(&bytes)?;

        if let Some(usage) = parsed.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Converse usage"
            );
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::transcript::{ContentBlock, Role};
    use crate::providers::sigv4::Credentials;
    use serde_json::json;

    fn gateway() -> BedrockGateway {
        let signer = SigV4Signer::new(Credentials::new("AKID", "secret"), "us-east-1", "bedrock");
        BedrockGateway::new(signer, "anthropic.claude-3-5-sonnet-20240620-v1:0")
    }

    #[test]
    fn model_id_is_percent_encoded_in_path() {
        let url = gateway().converse_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/anthropic.claude-3-5-sonnet-20240620-v1%3A0/converse"
        );
    }

    #[test]
    fn body_carries_system_and_tool_config() {
        let messages = vec![Message::user_text("hello")];
        let tools = vec![ToolSpec {
            name: "Joy_Count_Tool".into(),
            description: "Get the current joy count for the system.".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        }];
        let request = ConverseRequest {
            messages: &messages,
            system: "be helpful",
            tools: Some(&tools),
        };

        let gateway = gateway().with_inference_config(InferenceConfig {
            max_tokens: Some(2048),
            temperature: None,
        });
        let body = serde_json::to_value(gateway.build_body(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "messages": [{"role": "user", "content": [{"text": "hello"}]}],
                "system": [{"text": "be helpful"}],
                "toolConfig": {"tools": [{"toolSpec": {
                    "name": "Joy_Count_Tool",
                    "description": "Get the current joy count for the system.",
                    "inputSchema": {"json": {"type": "object", "properties": {}}}
                }}]},
                "inferenceConfig": {"maxTokens": 2048}
            })
        );
    }

    #[test]
    fn body_omits_empty_sections() {
        let messages = vec![Message::user_text("hello")];
        let request = ConverseRequest {
            messages: &messages,
            system: "",
            tools: None,
        };

        let body = serde_json::to_value(gateway().build_body(&request)).unwrap();
        assert_eq!(
            body,
            json!({"messages": [{"role": "user", "content": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn parses_tool_use_response() {
        let raw = json!({
            "output": {"message": {"role": "assistant", "content": [
                {"text": "Let me look that up."},
                {"toolUse": {"toolUseId": "tooluse_abc", "name": "Audit_Info_Tool", "input": {"name": "shop"}}}
            ]}},
            "stopReason": "tool_use",
            "usage": {"inputTokens": 12, "outputTokens": 30, "totalTokens": 42},
            "metrics": {"latencyMs": 812}
        });

        let response = parse_response(raw.to_string().as_bytes()).unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.usage.unwrap().total_tokens, 42);
        let tool_use = response.message.tool_uses().next().unwrap();
        assert_eq!(tool_use.tool_use_id, "tooluse_abc");
        assert_eq!(tool_use.input, json!({"name": "shop"}));
        assert_eq!(
            response.message.content[0],
            ContentBlock::Text("Let me look that up.".into())
        );
    }

    #[test]
    fn malformed_response_is_reported() {
        let err = parse_response(b"{\"output\": {}}").unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
    }

    #[test]
    fn throttling_is_distinguished() {
        assert!(classify_failure(StatusCode::TOO_MANY_REQUESTS, String::new()).is_throttled());
        assert!(
            classify_failure(
                StatusCode::BAD_REQUEST,
                "{\"__type\":\"ThrottlingException\"}".into()
            )
            .is_throttled()
        );
        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, "denied".into()),
            GatewayError::Status { status: 403, .. }
        ));
    }
}
