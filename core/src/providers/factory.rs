use crate::config::Config;
use crate::providers::bedrock::{BedrockGateway, InferenceConfig};
use crate::providers::knowledge_base::BedrockKnowledgeBase;
use crate::providers::models::resolve_model_id;
use crate::providers::sigv4::{Credentials, SigV4Signer};
use crate::traits::{Gateway, Retriever};
use anyhow::{Context, Result};
use std::sync::Arc;

fn signer(config: &Config) -> Result<SigV4Signer> {
    let region = config.resolved_region()?;
    let credentials = Credentials::from_env().context("No AWS credentials found")?;
    Ok(SigV4Signer::new(
        credentials,
        region,
        BedrockGateway::signing_service(),
    ))
}

pub fn create_gateway(config: &Config) -> Result<Arc<dyn Gateway>> {
    let gateway = BedrockGateway::new(signer(config)?, resolve_model_id(&config.model_id))
        .with_inference_config(InferenceConfig {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        });
    Ok(Arc::new(gateway))
}

/// `None` when no knowledge base is configured.
pub fn create_retriever(config: &Config) -> Result<Option<Arc<dyn Retriever>>> {
    let Some(kb_id) = config
        .knowledge_base_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
    else {
        return Ok(None);
    };

    let retriever = BedrockKnowledgeBase::new(signer(config)?, kb_id);
    Ok(Some(Arc::new(retriever)))
}
