//! Shared JSON parsing helpers.
//!
//! Numeric fields may arrive as JSON numbers (`1.1002`) or strings
//! (`"1.1002"`). With serde_json's `arbitrary_precision` feature a number
//! keeps its original text, so [`parse_decimal`] reads it straight into a
//! [`Decimal`] without ever going through `f64`.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse a JSON value (string or number) as [`Decimal`].
#[inline]
pub fn parse_decimal(v: Option<&serde_json::Value>) -> Option<Decimal> {
    match v? {
        serde_json::Value::Number(n) => decimal_from_text(&n.to_string()),
        serde_json::Value::String(s) => decimal_from_text(s.trim()),
        _ => None,
    }
}

/// Parse a named field on a JSON object as [`Decimal`].
#[inline]
pub fn parse_decimal_field(v: &serde_json::Value, key: &str) -> Option<Decimal> {
    parse_decimal(v.get(key))
}

/// Parse a JSON value (string or number) as `u64`.
///
/// Integral values written in exponent or decimal form (`1.61e12`,
/// `1610000000000.0`) are accepted as long as they have no fractional part.
#[inline]
pub fn parse_u64(v: Option<&serde_json::Value>) -> Option<u64> {
    let v = v?;
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    let d = parse_decimal(Some(v))?;
    if d.is_sign_negative() || !d.fract().is_zero() {
        return None;
    }
    u64::try_from(d.trunc()).ok()
}

/// Parse a named field as a non-empty string.
#[inline]
pub fn str_field<'a>(v: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    v.get(key)?.as_str().filter(|s| !s.is_empty())
}

fn decimal_from_text(s: &str) -> Option<Decimal> {
    if s.contains(['e', 'E']) {
        Decimal::from_scientific(s).ok()
    } else {
        Decimal::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn number_keeps_its_digits() {
        let v: serde_json::Value = serde_json::from_str(r#"{"a": 1.1002, "c": 0.86889}"#).unwrap();
        assert_eq!(parse_decimal_field(&v, "a"), Some(dec!(1.1002)));
        assert_eq!(parse_decimal_field(&v, "c").unwrap().to_string(), "0.86889");
    }

    #[test]
    fn long_fraction_is_exact() {
        let v: serde_json::Value = serde_json::from_str(r#"{"p": 0.123456789012345678}"#).unwrap();
        assert_eq!(parse_decimal_field(&v, "p").unwrap().to_string(), "0.123456789012345678");
    }

    #[test]
    fn string_and_integer_inputs() {
        let v = json!({"s": "30000.5", "i": 20, "bad": "abc", "b": true});
        assert_eq!(parse_decimal_field(&v, "s"), Some(dec!(30000.5)));
        assert_eq!(parse_decimal_field(&v, "i"), Some(dec!(20)));
        assert_eq!(parse_decimal_field(&v, "bad"), None);
        assert_eq!(parse_decimal_field(&v, "b"), None);
        assert_eq!(parse_decimal_field(&v, "missing"), None);
    }

    #[test]
    fn u64_parsing() {
        let v: serde_json::Value =
            serde_json::from_str(r#"{"t": 1610000000000, "s": "42", "f": 1.5, "n": -3}"#).unwrap();
        assert_eq!(parse_u64(v.get("t")), Some(1_610_000_000_000));
        assert_eq!(parse_u64(v.get("s")), Some(42));
        assert_eq!(parse_u64(v.get("f")), None);
        assert_eq!(parse_u64(v.get("n")), None);
    }

    #[test]
    fn empty_string_field_is_missing() {
        let v = json!({"p": "", "q": "EUR/USD", "n": 1});
        assert_eq!(str_field(&v, "p"), None);
        assert_eq!(str_field(&v, "q"), Some("EUR/USD"));
        assert_eq!(str_field(&v, "n"), None);
    }
}
