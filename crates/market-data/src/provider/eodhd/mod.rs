//! EODHD provider implementation.
//!
//! Fetches end-of-day bars from the EODHD REST API (or one of its internal
//! mirrors, depending on the configured environment).
//!
//! # API Endpoints
//!
//! - Bulk by date: `{base}/eod-bulk-last-day/{exchange}?date={date}&fmt=json`
//! - Per-ticker range: `{base}/eod/{ticker}.{exchange}?from={start}&to={end}&period=d&fmt=json`
//!
//! Both endpoints return JSON arrays of bar objects. Authentication is a
//! token query parameter.
//!
//! # Timeouts
//!
//! A per-ticker range response is a few hundred rows at most; the bulk
//! endpoint returns one row per listed instrument (tens of thousands). The
//! request deadline scales accordingly: bulk requests get a much longer
//! timeout than range requests.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use crate::environment::ApiEnvironment;
use crate::errors::ProviderError;
use crate::models::DailyBar;
use crate::provider::{PriceDataProvider, RateLimit};

const PROVIDER_ID: &str = "EODHD";

/// Exchange segment the crawler covers.
const EXCHANGE_CODE: &str = "US";

/// Deadline for a single-ticker range request.
const RANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for a whole-exchange bulk request.
const BULK_TIMEOUT: Duration = Duration::from_secs(180);

/// One row from the bulk-by-date endpoint.
#[derive(Debug, Deserialize)]
struct BulkBarRow {
    /// Ticker symbol
    code: String,
    /// Trading day ("YYYY-MM-DD")
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    #[serde(default)]
    adjusted_close: Option<Decimal>,
    #[serde(default)]
    volume: i64,
}

/// One row from the per-ticker range endpoint (no ticker in the payload).
#[derive(Debug, Deserialize)]
struct RangeBarRow {
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    #[serde(default)]
    adjusted_close: Option<Decimal>,
    #[serde(default)]
    volume: i64,
}

impl BulkBarRow {
    fn into_bar(self) -> DailyBar {
        DailyBar {
            ticker: self.code,
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adjusted_close: self.adjusted_close,
            volume: self.volume,
        }
    }
}

impl RangeBarRow {
    fn into_bar(self, ticker: &str) -> DailyBar {
        DailyBar {
            ticker: ticker.to_string(),
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adjusted_close: self.adjusted_close,
            volume: self.volume,
        }
    }
}

/// EODHD end-of-day data provider.
///
/// # Example
///
/// ```ignore
/// let provider = EodhdProvider::new(ApiEnvironment::Production, "demo".to_string());
/// let bars = provider.fetch_history("AAPL", start, end).await?;
/// ```
pub struct EodhdProvider {
    client: Client,
    base_url: String,
    api_token: String,
}

impl EodhdProvider {
    /// Create a provider targeting the given environment's gateway.
    pub fn new(environment: ApiEnvironment, api_token: String) -> Self {
        Self::with_base_url(environment.base_url().to_string(), api_token)
    }

    /// Create a provider against an explicit base URL (tests, stub servers).
    pub fn with_base_url(base_url: String, api_token: String) -> Self {
        let client = Client::builder()
            .timeout(RANGE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            api_token,
        }
    }

    fn bulk_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/eod-bulk-last-day/{}?date={}&fmt=json&api_token={}",
            self.base_url,
            EXCHANGE_CODE,
            date.format("%Y-%m-%d"),
            self.api_token
        )
    }

    fn range_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/eod/{}.{}?from={}&to={}&period=d&fmt=json&api_token={}",
            self.base_url,
            urlencoding::encode(ticker),
            EXCHANGE_CODE,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            self.api_token
        )
    }

    /// Issue a GET and map transport/status failures onto [`ProviderError`].
    ///
    /// `symbol` names what was asked for, so a 404 can surface as `NoData`
    /// for that instrument rather than a generic upstream error.
    async fn fetch(
        &self,
        url: &str,
        symbol: &str,
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    ProviderError::Network(e)
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            404 => {
                return Err(ProviderError::NoData {
                    symbol: symbol.to_string(),
                })
            }
            408 => {
                return Err(ProviderError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                })
            }
            429 => {
                return Err(ProviderError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                })
            }
            502 | 503 | 504 => {
                return Err(ProviderError::GatewayTimeout {
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        if !status.is_success() {
            return Err(ProviderError::Upstream {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP error: {}", status),
            });
        }

        response.text().await.map_err(|e| ProviderError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }

    fn parse_payload<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
        serde_json::from_str(body).map_err(|e| ProviderError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl PriceDataProvider for EodhdProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            max_concurrency: 10,
            min_delay: Duration::from_millis(500),
        }
    }

    async fn fetch_bulk_for_date(&self, date: NaiveDate) -> Result<Vec<DailyBar>, ProviderError> {
        let url = self.bulk_url(date);
        debug!("Fetching bulk bars for {} from {}", date, PROVIDER_ID);

        let body = self.fetch(&url, EXCHANGE_CODE, BULK_TIMEOUT).await?;
        let rows: Vec<BulkBarRow> = Self::parse_payload(&body)?;

        if rows.is_empty() {
            return Err(ProviderError::NoData {
                symbol: EXCHANGE_CODE.to_string(),
            });
        }

        Ok(rows.into_iter().map(BulkBarRow::into_bar).collect())
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError> {
        let url = self.range_url(ticker, start, end);
        debug!(
            "Fetching {} history {}..={} from {}",
            ticker, start, end, PROVIDER_ID
        );

        let body = self.fetch(&url, ticker, RANGE_TIMEOUT).await?;
        let rows: Vec<RangeBarRow> = Self::parse_payload(&body)?;

        if rows.is_empty() {
            return Err(ProviderError::NoData {
                symbol: ticker.to_string(),
            });
        }

        Ok(rows.into_iter().map(|r| r.into_bar(ticker)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn provider() -> EodhdProvider {
        EodhdProvider::with_base_url(
            "http://127.0.0.1:8091/api".to_string(),
            "test-token".to_string(),
        )
    }

    #[test]
    fn test_bulk_url_contains_date_and_exchange() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let url = provider().bulk_url(date);
        assert!(url.contains("/eod-bulk-last-day/US"));
        assert!(url.contains("date=2024-03-06"));
        assert!(url.contains("fmt=json"));
    }

    #[test]
    fn test_range_url_encodes_ticker() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let url = provider().range_url("BRK.A", start, end);
        assert!(url.contains("/eod/BRK.A.US"));
        assert!(url.contains("from=2024-01-02"));
        assert!(url.contains("to=2024-01-31"));
    }

    #[test]
    fn test_parse_bulk_payload() {
        let body = r#"[
            {"code":"AAPL","exchange_short_name":"US","date":"2024-03-06",
             "open":171.06,"high":171.24,"low":168.68,"close":169.12,
             "adjusted_close":168.39,"volume":68587700},
            {"code":"MSFT","exchange_short_name":"US","date":"2024-03-06",
             "open":405.0,"high":406.99,"low":398.39,"close":402.09,
             "adjusted_close":400.72,"volume":21809800}
        ]"#;

        let rows: Vec<BulkBarRow> = EodhdProvider::parse_payload(body).unwrap();
        assert_eq!(rows.len(), 2);

        let bar = rows.into_iter().next().unwrap().into_bar();
        assert_eq!(bar.ticker, "AAPL");
        assert_eq!(bar.close, dec!(169.12));
        assert_eq!(bar.adjusted_close, Some(dec!(168.39)));
        assert_eq!(bar.volume, 68_587_700);
    }

    #[test]
    fn test_parse_range_payload_without_adjusted_close() {
        let body = r#"[
            {"date":"2024-01-02","open":10.0,"high":10.5,"low":9.8,"close":10.2,"volume":1000}
        ]"#;

        let rows: Vec<RangeBarRow> = EodhdProvider::parse_payload(body).unwrap();
        let bar = rows.into_iter().next().unwrap().into_bar("XYZ");
        assert_eq!(bar.ticker, "XYZ");
        assert_eq!(bar.adjusted_close, None);
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed_payload() {
        let err = EodhdProvider::parse_payload::<Vec<RangeBarRow>>("{not json").unwrap_err();
        match err {
            ProviderError::Upstream { provider, .. } => assert_eq!(provider, "EODHD"),
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }
}
