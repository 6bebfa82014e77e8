pub mod api_types;
pub mod invoke;
pub mod llm;
pub mod providers;
pub mod report;
pub mod retry;

pub use invoke::{invoke_llm, LlmOutput};
pub use llm::{CompletionParams, LlmClient};
pub use report::{GeneratedReport, HolisticReport, HolisticReporter};
