//! Database model for securities.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::parse_timestamp;
use gapfill_core::securities::{Security, SecurityId, SecurityType};

/// Database model for one security row.
#[derive(
    Queryable,
    Identifiable,
    Selectable,
    Insertable,
    AsChangeset,
    Debug,
    Clone,
    Serialize,
    Deserialize,
    PartialEq,
    QueryableByName,
)]
#[diesel(table_name = crate::schema::securities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SecurityDB {
    pub id: String,
    pub ticker: String,
    pub name: Option<String>,
    pub exchange: String,
    pub security_type: String,
    pub is_active: bool,
    pub is_tracked: bool,
    pub priority_tier: Option<i32>,
    pub importance: i32,
    pub provider_unavailable: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Update payload for an existing security.
///
/// Excludes `provider_unavailable` and `created_at`: the skip flag only
/// changes through its dedicated mark/reset operations, never through a
/// feed-driven upsert.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::securities)]
pub struct UpdateSecurityDB {
    pub ticker: String,
    pub name: Option<String>,
    pub exchange: String,
    pub security_type: String,
    pub is_active: bool,
    pub is_tracked: bool,
    pub priority_tier: Option<i32>,
    pub importance: i32,
    pub updated_at: String,
}

impl From<SecurityDB> for Security {
    fn from(db: SecurityDB) -> Self {
        Security {
            id: SecurityId::new(db.id),
            ticker: db.ticker,
            name: db.name,
            exchange: db.exchange,
            security_type: SecurityType::from_storage_string(&db.security_type),
            is_active: db.is_active,
            is_tracked: db.is_tracked,
            priority_tier: db.priority_tier,
            importance: db.importance.clamp(1, 10) as u8,
            provider_unavailable: db.provider_unavailable,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
        }
    }
}

impl From<&Security> for SecurityDB {
    fn from(security: &Security) -> Self {
        SecurityDB {
            id: security.id.as_str().to_string(),
            ticker: security.ticker.clone(),
            name: security.name.clone(),
            exchange: security.exchange.clone(),
            security_type: security.security_type.to_storage_string(),
            is_active: security.is_active,
            is_tracked: security.is_tracked,
            priority_tier: security.priority_tier,
            importance: security.importance as i32,
            provider_unavailable: security.provider_unavailable,
            created_at: security.created_at.to_rfc3339(),
            updated_at: security.updated_at.to_rfc3339(),
        }
    }
}

impl From<&Security> for UpdateSecurityDB {
    fn from(security: &Security) -> Self {
        UpdateSecurityDB {
            ticker: security.ticker.clone(),
            name: security.name.clone(),
            exchange: security.exchange.clone(),
            security_type: security.security_type.to_storage_string(),
            is_active: security.is_active,
            is_tracked: security.is_tracked,
            priority_tier: security.priority_tier,
            importance: security.importance as i32,
            updated_at: security.updated_at.to_rfc3339(),
        }
    }
}
