//! Narrative analysis of telemetry samples through a chat-completion API.
//!
//! Narration fails open: every section always ends up with text, either the
//! model's answer or an "AI analysis unavailable" message.

pub mod error;
pub mod models;
pub mod narrative;
pub mod prompt;
pub mod providers;
pub mod summarizer;

pub use narrative::{narrate, NarrativeInput, Narratives};
pub use providers::azure_openai::AzureOpenAiProvider;
pub use summarizer::{summarize_or_unavailable, NarrativeSummarizer};
