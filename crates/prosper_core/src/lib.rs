pub mod config;
pub mod entities;
pub mod error;
pub mod prelude;
pub mod store;

pub use config::ProsperConfig;
pub use entities::*;
pub use error::{JobError, StoreError};
pub use store::{Entities, EntityStore, Query};

use serde::Serialize;

/// One user's unit of work that failed during a batch run. The run carries
/// on with the remaining users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserFailure {
    pub user: String,
    pub error: String,
}

impl UserFailure {
    pub fn new(user: &str, error: &JobError) -> Self {
        Self {
            user: user.to_string(),
            error: error.to_string(),
        }
    }
}
