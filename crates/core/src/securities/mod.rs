//! Security universe: identity, classification, importance scoring.

mod importance;
mod model;
mod store;

pub use importance::importance_score;
pub use model::{Security, SecurityId, SecurityType};
pub use store::SecurityStore;
