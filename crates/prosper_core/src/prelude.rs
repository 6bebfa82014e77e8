//! Common imports for job crates.

pub use crate::entities::{Entity, EntityKind, Stored};
pub use crate::error::{JobError, StoreError};
pub use crate::store::{Entities, EntityStore, Query};
pub use crate::UserFailure;
