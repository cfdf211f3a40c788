use crate::tools::read_json_file;
use crate::traits::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

pub const JOY_COUNT_FILE: &str = "joy-count.json";

pub struct JoyCountTool {
    source: PathBuf,
}

impl JoyCountTool {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            source: data_dir.as_ref().join(JOY_COUNT_FILE),
        }
    }
}

#[async_trait]
impl Tool for JoyCountTool {
    fn name(&self) -> &str {
        "Joy_Count_Tool"
    }

    fn description(&self) -> &str {
        "Get the current joy count for the system."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn invoke(&self, _input: Value) -> anyhow::Result<Value> {
        read_json_file(&self.source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ignores_input_and_returns_count() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(JOY_COUNT_FILE), r#"{"joyCount": 4200}"#).unwrap();

        let out = JoyCountTool::new(dir.path())
            .invoke(json!({"unexpected": true}))
            .await
            .unwrap();
        assert_eq!(out, json!({"joyCount": 4200}));
    }
}
