use prosper_core::UserFailure;
use prosper_engagement::{ClassifierRun, GeneratorRun, SuggestionDetail};
use prosper_reasoning::HolisticReport;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct EngagementResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "usersEvaluated")]
    pub users_evaluated: usize,
    #[serde(rename = "notificationsSent")]
    pub notifications_sent: usize,
    pub failures: Vec<UserFailure>,
}

impl From<ClassifierRun> for EngagementResponse {
    fn from(run: ClassifierRun) -> Self {
        Self {
            success: true,
            message: run.message(),
            users_evaluated: run.users_evaluated,
            notifications_sent: run.notifications_sent,
            failures: run.failures,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    #[serde(rename = "suggestionsCreated")]
    pub suggestions_created: usize,
    pub details: Vec<SuggestionDetail>,
    pub failures: Vec<UserFailure>,
}

impl From<GeneratorRun> for SuggestionsResponse {
    fn from(run: GeneratorRun) -> Self {
        Self {
            success: true,
            suggestions_created: run.suggestions_created,
            details: run.details,
            failures: run.failures,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report: HolisticReport,
}

/// Error body. `details` carries the underlying cause where there is one.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}
