// Order book frame parsing
// Turns one text frame from the feed into an OrderBookSnapshot

use serde_json::Value;

use crate::error::ProtocolError;
use crate::simulation::{OrderBookSnapshot, PriceLevel};

/// Fields every book frame must carry
pub const REQUIRED_FIELDS: [&str; 3] = ["symbol", "bids", "asks"];

/// Parse a raw text frame, stamping the snapshot with the current time
pub fn parse_book_message(text: &str) -> Result<OrderBookSnapshot, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    parse_book_value(&value)
}

/// Parse an already decoded frame.
///
/// Levels are `[price, size, ...]` arrays; price and size may be JSON numbers or
/// decimal strings. Anything after the second element is ignored.
pub fn parse_book_value(value: &Value) -> Result<OrderBookSnapshot, ProtocolError> {
    let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| !object.contains_key(**field)) {
        return Err(ProtocolError::MissingField(*missing));
    }

    let symbol = object["symbol"]
        .as_str()
        .ok_or_else(|| malformed("symbol", "expected a string"))?;
    let bids = parse_side("bids", &object["bids"])?;
    let asks = parse_side("asks", &object["asks"])?;

    Ok(OrderBookSnapshot::captured_now(symbol, bids, asks))
}

fn parse_side(field: &'static str, value: &Value) -> Result<Vec<PriceLevel>, ProtocolError> {
    let levels = value
        .as_array()
        .ok_or_else(|| malformed(field, "expected an array of levels"))?;

    levels
        .iter()
        .enumerate()
        .map(|(index, level)| parse_level(field, index, level))
        .collect()
}

fn parse_level(field: &'static str, index: usize, level: &Value) -> Result<PriceLevel, ProtocolError> {
    let pair = level
        .as_array()
        .filter(|values| values.len() >= 2)
        .ok_or_else(|| malformed(field, format!("level {} is not a [price, size] pair", index)))?;

    let price = parse_number(&pair[0])
        .ok_or_else(|| malformed(field, format!("level {} has a non-numeric price", index)))?;
    let size = parse_number(&pair[1])
        .ok_or_else(|| malformed(field, format!("level {} has a non-numeric size", index)))?;

    if !(price.is_finite() && size.is_finite()) || price < 0.0 || size < 0.0 {
        return Err(malformed(
            field,
            format!("level {} has an out-of-range value ({}, {})", index, price, size),
        ));
    }

    Ok(PriceLevel::new(price, size))
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn malformed(field: &'static str, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::MalformedField {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_levels() {
        let book = parse_book_message(
            r#"{"symbol":"BTC-USDT-SWAP","bids":[[100.0,10.0]],"asks":[[101.0,5.0],[102.0,10.0]]}"#,
        )
        .unwrap();

        assert_eq!(book.symbol(), "BTC-USDT-SWAP");
        assert_eq!(book.bids(), &[PriceLevel::new(100.0, 10.0)]);
        assert_eq!(book.asks().len(), 2);
        assert_eq!(book.asks()[1], PriceLevel::new(102.0, 10.0));
    }

    #[test]
    fn test_parse_string_levels_and_extra_fields() {
        let book = parse_book_message(
            r#"{
                "timestamp": "2025-05-04T10:39:13Z",
                "exchange": "OKX",
                "symbol": "BTC-USDT-SWAP",
                "asks": [["95445.5", "9.06", "0", "3"], ["95448", "2.05"]],
                "bids": [["95445.4", "1104.23"]]
            }"#,
        )
        .unwrap();

        assert_eq!(book.best_ask(), Some(&PriceLevel::new(95445.5, 9.06)));
        assert_eq!(book.best_bid(), Some(&PriceLevel::new(95445.4, 1104.23)));
        assert_eq!(book.asks().len(), 2);
    }

    #[test]
    fn test_empty_sides_are_valid() {
        let book = parse_book_message(r#"{"symbol":"X","bids":[],"asks":[]}"#).unwrap();
        assert!(!book.is_two_sided());
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            parse_book_message(r#"{"bids":[],"asks":[]}"#),
            Err(ProtocolError::MissingField("symbol"))
        );
        assert_eq!(
            parse_book_message(r#"{"symbol":"X","asks":[]}"#),
            Err(ProtocolError::MissingField("bids"))
        );
        assert_eq!(
            parse_book_message(r#"{"symbol":"X","bids":[]}"#),
            Err(ProtocolError::MissingField("asks"))
        );
    }

    #[test]
    fn test_not_json_or_not_object() {
        assert!(matches!(parse_book_message("heartbeat"), Err(ProtocolError::InvalidJson(_))));
        assert_eq!(parse_book_message("[1, 2]"), Err(ProtocolError::NotAnObject));
    }

    #[test]
    fn test_malformed_values() {
        let cases = [
            r#"{"symbol":42,"bids":[],"asks":[]}"#,
            r#"{"symbol":"X","bids":{},"asks":[]}"#,
            r#"{"symbol":"X","bids":[[100.0]],"asks":[]}"#,
            r#"{"symbol":"X","bids":[["abc","1"]],"asks":[]}"#,
            r#"{"symbol":"X","bids":[],"asks":[[101.0,null]]}"#,
            r#"{"symbol":"X","bids":[],"asks":[["NaN","1"]]}"#,
            r#"{"symbol":"X","bids":[],"asks":[[101.0,-1.0]]}"#,
        ];

        for case in cases {
            assert!(
                matches!(parse_book_message(case), Err(ProtocolError::MalformedField { .. })),
                "expected malformed field for {}",
                case
            );
        }
    }
}
