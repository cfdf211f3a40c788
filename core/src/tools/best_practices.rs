use crate::tools::extract_string_arg;
use crate::traits::{Retriever, Tool};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// Wraps retrieved passages and the question into a prompt that keeps the
/// model's answer grounded in the passages.
pub fn grounding_prompt(document_text: &str, question: &str) -> String {
    format!(
        "\nDOCUMENT:\n{document_text}\nQUESTION:\n{question}\nINSTRUCTIONS:\n\
Answer the user's QUESTION using only the DOCUMENT text above.\n\
Keep your answer strictly grounded in the facts provided. Do not refer to the \"DOCUMENT,\" \"documents,\" \"provided text,\" \"based on\" or any similar phrases in your answer.\n\
If the provided text contains the facts to answer the QUESTION, include all relevant details in your answer.\n\
If the provided text doesn't contain the facts to answer the QUESTION, respond only with \"I don't know\" and do not add any further information.\n"
    )
}

pub struct BestPracticesTool {
    retriever: Option<Arc<dyn Retriever>>,
    limit: usize,
}

impl BestPracticesTool {
    pub fn new(retriever: Option<Arc<dyn Retriever>>, limit: usize) -> Self {
        Self { retriever, limit }
    }
}

#[async_trait]
impl Tool for BestPracticesTool {
    fn name(&self) -> &str {
        "Best_Practices_Tool"
    }

    fn description(&self) -> &str {
        "Gets the company best practices"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to query the knowledge base."
                }
            },
            "required": ["question"]
        })
    }

    async fn invoke(&self, input: Value) -> anyhow::Result<Value> {
        let question = extract_string_arg(&input, "question")?;
        let retriever = self.retriever.as_ref().ok_or_else(|| {
            anyhow::anyhow!("No knowledge base configured. Set KNOWLEDGE_BASE_ID.")
        })?;

        let passages = retriever.retrieve(&question, self.limit).await?;
        tracing::debug!(
            retriever = retriever.name(),
            passages = passages.len(),
            "Retrieved best practices"
        );

        let document_text = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(json!({ "prompt": grounding_prompt(&document_text, &question) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RetrievedPassage;
    use std::sync::Mutex;

    struct FixedRetriever {
        passages: Vec<&'static str>,
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn retrieve(
            &self,
            query: &str,
            limit: usize,
        ) -> anyhow::Result<Vec<RetrievedPassage>> {
            self.seen.lock().unwrap().push((query.to_string(), limit));
            Ok(self
                .passages
                .iter()
                .take(limit)
                .map(|p| RetrievedPassage::new(*p))
                .collect())
        }
    }

    #[tokio::test]
    async fn builds_grounding_prompt_from_passages() {
        let retriever = Arc::new(FixedRetriever {
            passages: vec!["Use multiple AZs", "Joy should exceed 5000", "Encrypt at rest", "unused"],
            seen: Mutex::new(Vec::new()),
        });
        let tool = BestPracticesTool::new(Some(retriever.clone()), 3);

        let out = tool
            .invoke(json!({"question": "What joy count is healthy?"}))
            .await
            .unwrap();
        let prompt = out["prompt"].as_str().unwrap();

        assert!(prompt.contains(
            "DOCUMENT:\nUse multiple AZs, Joy should exceed 5000, Encrypt at rest\nQUESTION:\nWhat joy count is healthy?\nINSTRUCTIONS:"
        ));
        assert!(prompt.contains("respond only with \"I don't know\""));
        assert_eq!(
            retriever.seen.lock().unwrap().as_slice(),
            [("What joy count is healthy?".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn fails_without_knowledge_base() {
        let err = BestPracticesTool::new(None, 3)
            .invoke(json!({"question": "anything"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("knowledge base"));
    }
}
