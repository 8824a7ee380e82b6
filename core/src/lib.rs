pub mod completion;
pub mod config;
pub mod errors;
pub mod event;
pub mod handler;
pub mod telemetry;

pub use completion::openai::OpenAiClient;
pub use completion::{ChatMessage, CompletionClient, CompletionRequest};
pub use config::{AdviceConfig, load_config};
pub use errors::{AdviceError, Result, UpstreamError};
pub use event::{AdviceResult, InvocationEvent, InvocationResponse, RequestMethod};
pub use handler::AdviceHandler;
