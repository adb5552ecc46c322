use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One instrument's daily OHLCV bar as returned by an upstream provider.
///
/// Prices are kept as [`Decimal`] from the moment of deserialization so no
/// float rounding leaks into storage. `adjusted_close` is optional because
/// some endpoints omit it for instruments without corporate-action history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Exchange ticker (e.g. "AAPL")
    pub ticker: String,

    /// Trading day the bar covers
    pub date: NaiveDate,

    /// Opening price
    pub open: Decimal,

    /// High price
    pub high: Decimal,

    /// Low price
    pub low: Decimal,

    /// Closing price
    pub close: Decimal,

    /// Split/dividend adjusted close, when the provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_close: Option<Decimal>,

    /// Share volume
    pub volume: i64,
}

impl DailyBar {
    /// Create a bar with adjusted close defaulting to the raw close.
    pub fn new(
        ticker: impl Into<String>,
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            open,
            high,
            low,
            close,
            adjusted_close: Some(close),
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_defaults_adjusted_close_to_close() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let bar = DailyBar::new(
            "AAPL",
            date,
            dec!(169.00),
            dec!(171.24),
            dec!(168.68),
            dec!(169.12),
            52_488_700,
        );
        assert_eq!(bar.adjusted_close, Some(dec!(169.12)));
        assert_eq!(bar.ticker, "AAPL");
    }

    #[test]
    fn test_serde_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let bar = DailyBar::new(
            "MSFT",
            date,
            dec!(405.00),
            dec!(406.99),
            dec!(398.39),
            dec!(402.09),
            21_809_800,
        );

        let json = serde_json::to_string(&bar).unwrap();
        let back: DailyBar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bar);
    }
}
