pub mod gateway;
pub mod retriever;
pub mod tool;

pub use gateway::{ConverseRequest, ConverseResponse, Gateway, StopReason, TokenUsage};
pub use retriever::{RetrievedPassage, Retriever};
pub use tool::{Tool, ToolSpec};
