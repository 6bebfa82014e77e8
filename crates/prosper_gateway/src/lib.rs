pub mod server;
pub mod types;

pub use server::{AppState, GatewayServer};
pub use types::{EngagementResponse, ErrorBody, ReportResponse, SuggestionsResponse};
