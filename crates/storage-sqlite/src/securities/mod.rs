//! Security universe persistence.

mod model;
mod repository;

pub use model::SecurityDB;
pub use repository::SecurityRepository;
