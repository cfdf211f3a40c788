use crate::agent::ToolRegistry;
use crate::config::Config;
use crate::traits::Retriever;
use anyhow::Context;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

pub mod audit_info;
pub mod best_practices;
pub mod joy_count;

pub use audit_info::AuditInfoTool;
pub use best_practices::BestPracticesTool;
pub use joy_count::JoyCountTool;

pub fn extract_string_arg(args: &Value, key: &str) -> anyhow::Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
        .map(|s| s.to_string())
}

pub async fn read_json_file(path: &Path) -> anyhow::Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// The reference tool set. Empty when tools are switched off.
pub fn build_registry(config: &Config, retriever: Option<Arc<dyn Retriever>>) -> ToolRegistry {
    if !config.tools_enabled {
        return ToolRegistry::new();
    }

    ToolRegistry::new()
        .with_tool(Arc::new(AuditInfoTool::new(&config.data_dir)))
        .with_tool(Arc::new(JoyCountTool::new(&config.data_dir)))
        .with_tool(Arc::new(BestPracticesTool::new(
            retriever,
            config.retrieval_results,
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_lists_reference_tools_in_order() {
        let registry = build_registry(&Config::default(), None);
        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["Audit_Info_Tool", "Joy_Count_Tool", "Best_Practices_Tool"]
        );
    }

    #[test]
    fn disabled_tools_give_empty_registry() {
        let config = Config {
            tools_enabled: false,
            ..Default::default()
        };
        assert!(build_registry(&config, None).is_empty());
    }

    #[test]
    fn missing_string_arg_is_an_error() {
        let err = extract_string_arg(&json!({"other": 1}), "name").unwrap_err();
        assert_eq!(err.to_string(), "Missing 'name' parameter");
        assert_eq!(
            extract_string_arg(&json!({"name": "shop"}), "name").unwrap(),
            "shop"
        );
    }

    #[tokio::test]
    async fn read_json_file_reports_bad_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = read_json_file(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }
}
