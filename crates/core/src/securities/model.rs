//! Security identity and classification types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// SecurityId
// =============================================================================

/// Externally assigned security identity.
///
/// Assigned by whichever system first created the security and preserved
/// verbatim by the upsert layer; it is never regenerated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SecurityId(pub String);

impl SecurityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SecurityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecurityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SecurityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// SecurityType
// =============================================================================

/// Instrument classification.
///
/// The ranking order prefers common stock over every other type; the
/// remaining types rank in the order listed here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityType {
    CommonStock,
    Etf,
    Fund,
    PreferredStock,
    Unit,
    Warrant,
    Other,
}

impl SecurityType {
    /// Ranking position, lower is scheduled first.
    pub fn rank(&self) -> u8 {
        match self {
            SecurityType::CommonStock => 0,
            SecurityType::Etf => 1,
            SecurityType::Fund => 2,
            SecurityType::PreferredStock => 3,
            SecurityType::Unit => 4,
            SecurityType::Warrant => 5,
            SecurityType::Other => 6,
        }
    }

    /// Converts to the string representation for storage.
    pub fn to_storage_string(&self) -> String {
        match self {
            SecurityType::CommonStock => "COMMON_STOCK",
            SecurityType::Etf => "ETF",
            SecurityType::Fund => "FUND",
            SecurityType::PreferredStock => "PREFERRED_STOCK",
            SecurityType::Unit => "UNIT",
            SecurityType::Warrant => "WARRANT",
            SecurityType::Other => "OTHER",
        }
        .to_string()
    }

    /// Parses from the storage string representation.
    pub fn from_storage_string(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "COMMON_STOCK" => SecurityType::CommonStock,
            "ETF" => SecurityType::Etf,
            "FUND" => SecurityType::Fund,
            "PREFERRED_STOCK" => SecurityType::PreferredStock,
            "UNIT" => SecurityType::Unit,
            "WARRANT" => SecurityType::Warrant,
            _ => SecurityType::Other,
        }
    }
}

impl Default for SecurityType {
    fn default() -> Self {
        SecurityType::CommonStock
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_storage_string())
    }
}

// =============================================================================
// Security
// =============================================================================

/// One instrument of the crawled universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub id: SecurityId,
    pub ticker: String,
    pub name: Option<String>,
    pub exchange: String,
    pub security_type: SecurityType,
    /// Inactive securities never enter gap cycles.
    pub is_active: bool,
    /// Tracked securities get the precise per-security gap branch.
    pub is_tracked: bool,
    /// Scheduling tier for tracked securities; lower runs first.
    /// Untracked securities carry no tier and rank last.
    pub priority_tier: Option<i32>,
    /// Relevance heuristic, 1 (lowest) to 10 (highest).
    pub importance: u8,
    /// Set after the provider reported "no data" for this instrument.
    /// Excluded from gap cycles until explicitly reset.
    pub provider_unavailable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Security {
    /// New active, untracked security with a computed importance score.
    pub fn new(
        id: impl Into<SecurityId>,
        ticker: impl Into<String>,
        exchange: impl Into<String>,
        security_type: SecurityType,
    ) -> Self {
        let ticker = ticker.into();
        let exchange = exchange.into();
        let importance = super::importance_score(&ticker, None, &exchange, &security_type);
        let now = Utc::now();

        Self {
            id: id.into(),
            ticker,
            name: None,
            exchange,
            security_type,
            is_active: true,
            is_tracked: false,
            priority_tier: None,
            importance,
            provider_unavailable: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_type_storage_round_trip() {
        for t in [
            SecurityType::CommonStock,
            SecurityType::Etf,
            SecurityType::Fund,
            SecurityType::PreferredStock,
            SecurityType::Unit,
            SecurityType::Warrant,
            SecurityType::Other,
        ] {
            assert_eq!(SecurityType::from_storage_string(&t.to_storage_string()), t);
        }
        assert_eq!(
            SecurityType::from_storage_string("common_stock"),
            SecurityType::CommonStock
        );
        assert_eq!(
            SecurityType::from_storage_string("SOMETHING_NEW"),
            SecurityType::Other
        );
    }

    #[test]
    fn test_common_stock_ranks_first() {
        let others = [
            SecurityType::Etf,
            SecurityType::Fund,
            SecurityType::PreferredStock,
            SecurityType::Unit,
            SecurityType::Warrant,
            SecurityType::Other,
        ];
        for t in others {
            assert!(SecurityType::CommonStock.rank() < t.rank());
        }
    }

    #[test]
    fn test_new_security_defaults() {
        let security = Security::new("sec-1", "AAPL", "NASDAQ", SecurityType::CommonStock);
        assert!(security.is_active);
        assert!(!security.is_tracked);
        assert!(!security.provider_unavailable);
        assert!(security.priority_tier.is_none());
        assert!((1..=10).contains(&security.importance));
    }
}
