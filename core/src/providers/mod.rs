pub mod bedrock;
pub mod factory;
pub mod knowledge_base;
pub mod models;
pub mod sigv4;

pub use bedrock::{BedrockGateway, InferenceConfig};
pub use factory::{create_gateway, create_retriever};
pub use knowledge_base::BedrockKnowledgeBase;
pub use models::{DEFAULT_MODEL_ID, ModelInfo, SUPPORTED_MODELS, resolve_model_id};
pub use sigv4::{Credentials, SigV4Signer};
