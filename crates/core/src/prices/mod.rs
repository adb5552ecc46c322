//! Daily price records and their persistence trait.

mod model;
mod store;

pub use model::{PriceRecord, PriceSource, SOURCE_FORWARD_FILL, SOURCE_TRANSFER};
pub use store::PriceStore;
