//! Core data models for the fare collector
//!
//! This module contains the value types shared by the stop directory, the page
//! cache, the fare extractor and the trip fetcher.

pub mod fare;
pub mod stops;
pub mod transport;
pub mod trip;

pub use fare::{extract_fare, ParseFailure};
pub use stops::{normalize_town, StopDirectory, StopError};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
pub use trip::{TripError, TripFetcher};

use std::fmt;

use chrono::NaiveDateTime;

/// A town name known to the stop directory
///
/// Only the directory hands these out, so holding a `StopName` means the name
/// has been normalized and validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopName(String);

impl StopName {
    pub(crate) fn new(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StopName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StopName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A fare amount in dollars, stored as whole cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fare {
    cents: u64,
}

impl Fare {
    /// Creates a fare from a cent amount. Zero is not a fare.
    pub fn from_cents(cents: u64) -> Option<Self> {
        (cents > 0).then_some(Self { cents })
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    /// Parses a currency string such as `"$12.34"` or `"$1,204.5"`.
    ///
    /// # Returns
    /// * `Some(Fare)` for a positive amount with at most two decimal places
    /// * `None` for empty, non-numeric, zero or over-precise text
    pub fn parse_currency(text: &str) -> Option<Self> {
        let cleaned: String = text
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let cleaned = cleaned.trim();

        let (whole, frac) = match cleaned.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (cleaned, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let dollars: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let cents: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };
        Self::from_cents(dollars.checked_mul(100)?.checked_add(cents)?)
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

/// A raw HTML document body, either freshly fetched or read back from cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage(String);

impl RawPage {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One validated origin/destination lookup at a given departure time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    pub origin: StopName,
    pub destination: StopName,
    /// Departure time, minute precision
    pub when: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_plain() {
        assert_eq!(Fare::parse_currency("$12.34").unwrap().cents(), 1234);
        assert_eq!(Fare::parse_currency(" $9.00 ").unwrap().cents(), 900);
    }

    #[test]
    fn test_parse_currency_short_forms() {
        assert_eq!(Fare::parse_currency("$5").unwrap().cents(), 500);
        assert_eq!(Fare::parse_currency("$5.5").unwrap().cents(), 550);
        assert_eq!(Fare::parse_currency("$.75").unwrap().cents(), 75);
        assert_eq!(Fare::parse_currency("$1,204.50").unwrap().cents(), 120450);
    }

    #[test]
    fn test_parse_currency_rejects_garbage() {
        assert!(Fare::parse_currency("").is_none());
        assert!(Fare::parse_currency("$").is_none());
        assert!(Fare::parse_currency("N/A").is_none());
        assert!(Fare::parse_currency("$1.234").is_none());
        assert!(Fare::parse_currency("$-3.00").is_none());
        assert!(Fare::parse_currency("$0.00").is_none());
    }

    #[test]
    fn test_fare_display_two_decimals() {
        assert_eq!(Fare::from_cents(900).unwrap().to_string(), "9.00");
        assert_eq!(Fare::from_cents(1205).unwrap().to_string(), "12.05");
        assert_eq!(Fare::from_cents(7).unwrap().to_string(), "0.07");
    }

    #[test]
    fn test_fare_ordering_by_amount() {
        let low = Fare::parse_currency("$9.00").unwrap();
        let high = Fare::parse_currency("$12.50").unwrap();
        assert!(low < high);
        assert_eq!([high, low].into_iter().min(), Some(low));
    }
}
