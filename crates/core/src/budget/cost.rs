//! Flat per-request cost model.

use serde::{Deserialize, Serialize};

/// Credits charged per upstream request, regardless of how many rows the
/// response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostModel {
    /// One bulk-by-date request (all instruments, one date).
    pub bulk_fetch: u32,
    /// One per-ticker range request.
    pub range_fetch: u32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            bulk_fetch: 1,
            range_fetch: 1,
        }
    }
}
