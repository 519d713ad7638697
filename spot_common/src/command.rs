//! Query commands exchanged between the client and the daemon's query endpoint.
//!
//! One JSON `Request` is sent per TCP connection and answered by one JSON `Response`.
//! The shapes mirror the read API: all prices, one metal priced by weight, the
//! exchange rate, health, and a raw multi-key read.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ServiceError};
use crate::keys::{Currency, QuoteKey};
use crate::service::{AllPrices, Health, Lookup, MetalQuote, RateView};

/// Query sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    /// Every metal plus the exchange rate.
    Prices,
    /// One metal priced for `grams` in `currency`.
    Price {
        metal: String,
        grams: f64,
        #[serde(default)]
        currency: Currency,
    },
    /// Current USD/IDR rate.
    ExchangeRate,
    /// Per-key availability.
    Health,
    /// Raw lookups for the given keys.
    Read { keys: Vec<QuoteKey> },
}

/// Answer to a `Request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Answer to `Request::Prices`.
    Prices(AllPrices),
    /// Answer to `Request::Price`.
    Price(MetalQuote),
    /// Answer to `Request::ExchangeRate`.
    ExchangeRate(RateView),
    /// Answer to `Request::Health`.
    Health(Health),
    /// Answer to `Request::Read`.
    Quotes { quotes: BTreeMap<QuoteKey, Lookup> },
    /// Any failure, classified for the caller.
    Error { kind: ErrorKind, message: String },
}

impl From<ServiceError> for Response {
    fn from(err: ServiceError) -> Self {
        Response::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_json_shape() {
        let request: Request =
            serde_json::from_str(r#"{"command": "price", "metal": "gold", "grams": 10.0}"#).unwrap();
        assert_eq!(
            request,
            Request::Price {
                metal: "gold".to_string(),
                grams: 10.0,
                currency: Currency::Usd,
            }
        );
        let read = serde_json::to_value(Request::Read { keys: vec![QuoteKey::Usdidr] }).unwrap();
        assert_eq!(read["command"], "read");
        assert_eq!(read["keys"][0], "usdidr");
    }

    #[test]
    fn service_errors_become_classified_responses() {
        let response = Response::from(ServiceError::RateUnavailable);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "unavailable");
    }
}
