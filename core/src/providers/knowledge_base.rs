use crate::providers::bedrock::classify_failure;
use crate::providers::sigv4::SigV4Signer;
use crate::traits::{RetrievedPassage, Retriever};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveBody<'a> {
    retrieval_query: RetrievalQuery<'a>,
    retrieval_configuration: RetrievalConfiguration,
}

#[derive(Debug, Serialize)]
struct RetrievalQuery<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration {
    vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration {
    number_of_results: usize,
    override_search_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveOutput {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    content: RetrievalContent,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    location: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RetrievalContent {
    text: String,
}

/// Bedrock knowledge base queried through the Agent Runtime `Retrieve` API
/// with hybrid search.
pub struct BedrockKnowledgeBase {
    client: reqwest::Client,
    signer: SigV4Signer,
    knowledge_base_id: String,
    endpoint: String,
}

impl BedrockKnowledgeBase {
    pub fn new(signer: SigV4Signer, knowledge_base_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        let endpoint = format!(
            "https://bedrock-agent-runtime.{}.amazonaws.com",
            signer.region()
        );

        Self {
            client,
            signer,
            knowledge_base_id: knowledge_base_id.into(),
            endpoint,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn retrieve_url(&self) -> Result<Url> {
        let url = format!(
            "{}/knowledgebases/{}/retrieve",
            self.endpoint,
            urlencoding::encode(&self.knowledge_base_id)
        );
        Url::parse(&url).with_context(|| format!("Invalid knowledge base endpoint {}", url))
    }
}

fn build_body(query: &str, limit: usize) -> RetrieveBody<'_> {
    RetrieveBody {
        retrieval_query: RetrievalQuery { text: query },
        retrieval_configuration: RetrievalConfiguration {
            vector_search_configuration: VectorSearchConfiguration {
                number_of_results: limit,
                override_search_type: "HYBRID",
            },
        },
    }
}

fn parse_passages(bytes: &[u8]) -> Result<Vec<RetrievedPassage>> {
    let output: RetrieveOutput =
        serde_json::from_slice(bytes).context("Malformed knowledge base response")?;

    Ok(output
        .retrieval_results
        .into_iter()
        .map(|r| RetrievedPassage {
            text: r.content.text,
            score: r.score,
            location: r.location.map(|l| l.to_string()),
        })
        .collect())
}

#[async_trait]
impl Retriever for BedrockKnowledgeBase {
    fn name(&self) -> &str {
        "bedrock-knowledge-base"
    }

    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>> {
        let url = self.retrieve_url()?;
        let body = serde_json::to_vec(&build_body(query, limit))?;
        let headers = self
            .signer
            .sign("POST", &url, CONTENT_TYPE, &body, chrono::Utc::now())?;

        tracing::debug!(knowledge_base = %self.knowledge_base_id, limit, "Retrieving passages");

        let mut builder = self.client.post(url).header("content-type", CONTENT_TYPE);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, error_text).into());
        }

        let bytes = response.bytes().await?;
        parse_passages(&bytes)
    }
}
