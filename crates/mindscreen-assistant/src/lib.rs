//! Mindscreen Assistant
//!
//! Therapeutic replies around the analysis pipeline.
//!
//! - [`CompletionBackend`] is the seam to any text-completion provider
//! - [`TherapeuticResponder`] builds the prompt, enforces the timeout and
//!   falls back to locale tables on any failure
//! - [`Assistant`] ties analysis, metrics, session analytics and replies together

pub mod assistant;
pub mod completion;
pub mod config;
pub mod context;
pub mod fallback;
pub mod prompt;
pub mod responder;
pub mod response;

pub use assistant::{Assistant, AssistantReply};
pub use completion::{CompletionBackend, CompletionRequest, OpenAiCompatibleBackend};
pub use config::AssistantConfig;
pub use context::{ContextClassifier, MessageContext};
pub use fallback::ResponseTable;
pub use responder::TherapeuticResponder;
pub use response::{ResponseSource, RiskAssessment, TherapeuticResponse};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::assistant::{Assistant, AssistantReply};
    pub use crate::completion::{CompletionBackend, CompletionRequest};
    pub use crate::config::AssistantConfig;
    pub use crate::responder::TherapeuticResponder;
    pub use crate::response::TherapeuticResponse;
}
