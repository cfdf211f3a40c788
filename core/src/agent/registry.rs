use crate::traits::{Tool, ToolSpec};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Payload handed back to the model when a tool cannot produce a result.
pub fn error_payload(message: impl Into<String>) -> Value {
    json!({
        "error": "true",
        "message": message.into(),
    })
}

pub fn is_error_payload(value: &Value) -> bool {
    value.get("error").and_then(Value::as_str) == Some("true")
}

/// Fixed set of tools, filled once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if self.find(tool.name()).is_some() {
            warn!(tool = tool.name(), "Tool already registered, ignoring duplicate");
            return;
        }
        self.tools.push(tool);
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Declarations in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn resolve(&self, name: &str) -> Option<ToolSpec> {
        self.find(name).map(|t| t.spec())
    }

    /// Never fails: unknown names and handler errors come back as an error
    /// payload the model can react to.
    pub async fn invoke(&self, name: &str, input: Value) -> Value {
        let Some(tool) = self.find(name) else {
            warn!(tool = name, "Model requested an unknown tool");
            return error_payload(format!(
                "The requested tool with name '{}' does not exist.",
                name
            ));
        };

        debug!(tool = name, %input, "Invoking tool");
        match tool.invoke(input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                error_payload(format!("The tool '{}' failed: {:#}", name, e))
            }
        }
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }
}
