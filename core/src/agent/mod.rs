pub mod attachment;
pub mod dispatch;
pub mod prompt;
pub mod registry;
pub mod session;
#[cfg(test)]
pub(crate) mod testing;
pub mod transcript;

pub use attachment::Attachment;
pub use dispatch::{AbortReason, DispatchLoop, RecursionBudget, TurnEvent, TurnOutcome};
pub use registry::ToolRegistry;
pub use session::{Session, UserInput};
pub use transcript::{ContentBlock, ImageFormat, Message, Role, ToolOutput, Transcript};
