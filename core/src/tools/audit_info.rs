use crate::tools::{extract_string_arg, read_json_file};
use crate::traits::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

pub const AUDIT_INFO_FILE: &str = "audit-info.json";

/// Audit records for a named system, served from a JSON file in the data
/// directory.
pub struct AuditInfoTool {
    source: PathBuf,
}

impl AuditInfoTool {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            source: data_dir.as_ref().join(AUDIT_INFO_FILE),
        }
    }
}

#[async_trait]
impl Tool for AuditInfoTool {
    fn name(&self) -> &str {
        "Audit_Info_Tool"
    }

    fn description(&self) -> &str {
        "Get the current audit info for a given system based on it's name."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The name of the system."
                }
            },
            "required": ["name"]
        })
    }

    async fn invoke(&self, input: Value) -> anyhow::Result<Value> {
        let name = extract_string_arg(&input, "name")?;
        tracing::debug!(system = %name, "Fetching audit info");
        read_json_file(&self.source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(AUDIT_INFO_FILE),
            r#"{"system": "shop", "lastAudit": "2024-05-01", "findings": 2}"#,
        )
        .unwrap();

        let tool = AuditInfoTool::new(dir.path());
        let out = tool.invoke(json!({"name": "shop"})).await.unwrap();
        assert_eq!(out["findings"], 2);
        assert_eq!(out["system"], "shop");
    }

    #[tokio::test]
    async fn requires_system_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(AUDIT_INFO_FILE), "{}").unwrap();

        let err = AuditInfoTool::new(dir.path())
            .invoke(json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AuditInfoTool::new(dir.path())
            .invoke(json!({"name": "shop"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains(AUDIT_INFO_FILE));
    }

    #[test]
    fn schema_requires_name() {
        let spec = AuditInfoTool::new("demo").spec();
        assert_eq!(spec.input_schema["required"], json!(["name"]));
    }
}
