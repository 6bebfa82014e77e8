//! Rule-based engagement jobs: templated notifications driven by the
//! engagement tracker, and a single proactive suggestion per user chosen from
//! an ordered scenario cascade.

pub mod catalog;
pub mod classifier;
pub mod scenarios;
pub mod suggestions;

pub use catalog::{Bucket, MessageTemplate};
pub use classifier::{ClassifierRun, EngagementClassifier, Evaluation, GuardStamps, LapseTier};
pub use scenarios::{default_cascade, first_match, Scenario, SuggestionDraft, UserSnapshot};
pub use suggestions::{GeneratorRun, SuggestionDetail, SuggestionGenerator};
