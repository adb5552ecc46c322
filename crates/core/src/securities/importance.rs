//! Importance scoring heuristic.
//!
//! Produces the 1..=10 relevance score used as a ranking input. The score is
//! a pure function of exchange, security type, ticker length, and name
//! patterns, so recomputing it for an unchanged security always yields the
//! same value.

use super::model::SecurityType;
use crate::constants::{IMPORTANCE_MAX, IMPORTANCE_MIN};

/// Exchanges whose listings score above the baseline.
const MAJOR_EXCHANGES: &[&str] = &["NYSE", "NASDAQ"];

/// Name fragments that mark derivative or bundled instruments.
const DERIVATIVE_NAME_MARKERS: &[&str] = &["warrant", "right", "unit "];

/// Name fragments that mark pooled vehicles.
const POOLED_NAME_MARKERS: &[&str] = &["trust", "fund", "acquisition"];

/// Importance score for a security, clamped to 1..=10.
pub fn importance_score(
    ticker: &str,
    name: Option<&str>,
    exchange: &str,
    security_type: &SecurityType,
) -> u8 {
    let mut score: i32 = 5;

    if MAJOR_EXCHANGES
        .iter()
        .any(|e| exchange.eq_ignore_ascii_case(e))
    {
        score += 2;
    }

    score += match security_type {
        SecurityType::CommonStock => 2,
        SecurityType::Etf => 1,
        SecurityType::Fund => 0,
        SecurityType::PreferredStock => -1,
        SecurityType::Unit | SecurityType::Warrant => -2,
        SecurityType::Other => -1,
    };

    // Short tickers correlate with established listings; long ones with
    // derivative share classes (e.g. "ACMEW", "ACME.U").
    match ticker.len() {
        0..=3 => score += 1,
        4 => {}
        _ => score -= 1,
    }

    if let Some(name) = name {
        let lowered = name.to_lowercase();
        if DERIVATIVE_NAME_MARKERS.iter().any(|m| lowered.contains(m)) {
            score -= 2;
        } else if POOLED_NAME_MARKERS.iter().any(|m| lowered.contains(m)) {
            score -= 1;
        }
    }

    score.clamp(IMPORTANCE_MIN as i32, IMPORTANCE_MAX as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_exchange_common_stock_scores_high() {
        let score = importance_score("AAPL", Some("Apple Inc."), "NASDAQ", &SecurityType::CommonStock);
        assert_eq!(score, 9);
    }

    #[test]
    fn test_short_ticker_bonus() {
        let short = importance_score("F", None, "NYSE", &SecurityType::CommonStock);
        let long = importance_score("ACMEW", None, "NYSE", &SecurityType::CommonStock);
        assert!(short > long);
    }

    #[test]
    fn test_warrant_scores_low() {
        let score = importance_score(
            "SPACW",
            Some("Spac Corp Warrant"),
            "OTC",
            &SecurityType::Warrant,
        );
        assert_eq!(score, 1);
    }

    #[test]
    fn test_score_is_clamped() {
        for ticker in ["A", "ACMEWIDGETS"] {
            for exchange in ["NYSE", "OTC"] {
                for t in [
                    SecurityType::CommonStock,
                    SecurityType::Warrant,
                    SecurityType::Other,
                ] {
                    let score = importance_score(ticker, Some("Total Trust Warrant Unit "), exchange, &t);
                    assert!((1..=10).contains(&score));
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let a = importance_score("MSFT", Some("Microsoft"), "NASDAQ", &SecurityType::CommonStock);
        let b = importance_score("MSFT", Some("Microsoft"), "NASDAQ", &SecurityType::CommonStock);
        assert_eq!(a, b);
    }
}
