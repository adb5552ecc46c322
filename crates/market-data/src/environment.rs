//! Deployment environments and endpoint resolution.
//!
//! A crawl session is started against a named environment; the environment
//! decides which data gateway the provider talks to. Production goes straight
//! to the vendor API, staging goes through the internal caching mirror, and
//! local targets a stub server for development.

use std::fmt;

/// Named deployment environment a session runs against.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ApiEnvironment {
    /// Vendor API, real credentials, real budget consumption.
    Production,
    /// Internal caching mirror of the vendor API.
    Staging,
    /// Local stub server for development.
    Local,
}

impl ApiEnvironment {
    pub const PRODUCTION_STR: &'static str = "production";
    pub const STAGING_STR: &'static str = "staging";
    pub const LOCAL_STR: &'static str = "local";

    /// Base URL of the data gateway for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://eodhd.com/api",
            Self::Staging => "https://eod-mirror.stage.internal/api",
            Self::Local => "http://127.0.0.1:8091/api",
        }
    }

    /// Parses an environment name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            Self::PRODUCTION_STR | "prod" => Some(Self::Production),
            Self::STAGING_STR | "stage" => Some(Self::Staging),
            Self::LOCAL_STR | "dev" => Some(Self::Local),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => Self::PRODUCTION_STR,
            Self::Staging => Self::STAGING_STR,
            Self::Local => Self::LOCAL_STR,
        }
    }
}

impl fmt::Display for ApiEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
