pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{DispatchLoop, Session, ToolRegistry, TurnEvent, TurnOutcome, UserInput};
pub use config::Config;
pub use error::{AttachmentError, GatewayError, SessionError};
pub use providers::{create_gateway, create_retriever};
pub use tools::build_registry;
pub use traits::{Gateway, Retriever, StopReason, Tool, ToolSpec};
