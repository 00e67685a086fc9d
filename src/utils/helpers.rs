use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Backend response envelope.
///
/// Some endpoints nest the payload under a named key instead of `data`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default = "Option::default",
        alias = "event",
        alias = "contributions",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            message: None,
            data: None,
            error: Some(message),
        }
    }

    /// Unwraps the payload, treating `success: false` as a rejected request.
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::BadRequest(
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "Request was rejected".to_string()),
            ))
        }
    }

    /// Like [`ApiResponse::into_result`], but a missing payload is an error.
    pub fn into_data(self) -> Result<T, ApiError> {
        self.into_result()?
            .ok_or_else(|| ApiError::Decode("response did not contain a payload".to_string()))
    }
}

/// Settles a write whose response body, if any, is an envelope without a
/// payload the caller needs.
pub fn acknowledge<T>(response: Option<ApiResponse<T>>) -> Result<(), ApiError> {
    match response {
        Some(response) => response.into_result().map(|_| ()),
        None => Ok(()),
    }
}

/// Firestore-style `{ _seconds, _nanoseconds }` timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireTimestamp {
    #[serde(rename = "_seconds")]
    pub seconds: i64,
    #[serde(rename = "_nanoseconds", default)]
    pub nanoseconds: u32,
}

impl WireTimestamp {
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanoseconds).single()
    }
}

/// Formats an amount the way the `en-IN` locale does: `₹1,00,001`.
pub fn format_inr(amount: Decimal) -> String {
    let normalized = amount.normalize().to_string();
    let (sign, unsigned) = match normalized.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", normalized.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::new();
    if integer.len() > 3 {
        let (head, tail) = integer.split_at(integer.len() - 3);
        let offset = head.len() % 2;
        for (i, digit) in head.chars().enumerate() {
            if i > 0 && (i + 2 - offset) % 2 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        grouped.push(',');
        grouped.push_str(tail);
    } else {
        grouped.push_str(integer);
    }

    match fraction {
        Some(fraction) => format!("{sign}₹{grouped}.{fraction}"),
        None => format!("{sign}₹{grouped}"),
    }
}

/// `17 Oct 2026`
pub fn format_event_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

/// Serializes a `Decimal` as a plain JSON number, integral amounts without a
/// fractional part.
pub mod amount_number {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};

    pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        if amount.fract().is_zero() {
            if let Some(whole) = amount.to_i64() {
                return serializer.serialize_i64(whole);
            }
        }
        let value = amount
            .to_f64()
            .ok_or_else(|| S::Error::custom(format!("amount {amount} is out of range")))?;
        serializer.serialize_f64(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::Number(n) => n
                .to_string()
                .parse::<Decimal>()
                .map_err(|e| D::Error::custom(format!("invalid amount {n}: {e}"))),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<Decimal>()
                .map_err(|e| D::Error::custom(format!("invalid amount {s:?}: {e}"))),
            other => Err(D::Error::custom(format!("invalid amount {other}"))),
        }
    }
}

/// Accepts both `2026-10-17` and full RFC 3339 timestamps for event dates.
pub mod flexible_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid event date {raw:?}")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn formats_amounts_with_indian_grouping() {
        let cases = [
            ("0", "₹0"),
            ("501", "₹501"),
            ("1100", "₹1,100"),
            ("100001", "₹1,00,001"),
            ("2500000", "₹25,00,000"),
            ("12345678.50", "₹1,23,45,678.5"),
            ("-1500", "-₹1,500"),
        ];
        for (input, expected) in cases {
            assert_eq!(format_inr(Decimal::from_str(input).unwrap()), expected, "{input}");
        }
    }

    #[test]
    fn formats_event_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 7).unwrap();
        assert_eq!(format_event_date(date), "7 Oct 2026");
    }

    #[test]
    fn envelope_accepts_named_payload_keys() {
        let response: ApiResponse<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"contributions":[1,2]}"#).unwrap();
        assert_eq!(response.into_data().unwrap(), vec![1, 2]);

        let response: ApiResponse<String> =
            serde_json::from_str(r#"{"event":"abc"}"#).unwrap();
        assert_eq!(response.into_data().unwrap(), "abc");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Receipt {
        id: String,
    }

    #[test]
    fn envelope_payload_needs_no_default() {
        let response: ApiResponse<Receipt> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), None);

        let response: ApiResponse<Receipt> =
            serde_json::from_str(r#"{"data":{"id":"r1"}}"#).unwrap();
        assert_eq!(response.into_data().unwrap(), Receipt { id: "r1".into() });
    }

    #[test]
    fn unsuccessful_envelope_becomes_bad_request() {
        let response: ApiResponse<String> =
            serde_json::from_str(r#"{"success":false,"message":"UPI id taken"}"#).unwrap();
        assert_eq!(
            response.into_result(),
            Err(ApiError::BadRequest("UPI id taken".to_string()))
        );
    }

    #[test]
    fn empty_write_response_is_acknowledged() {
        assert_eq!(acknowledge::<()>(None), Ok(()));
        assert!(acknowledge(Some(ApiResponse::<()>::error("nope".into()))).is_err());
    }

    #[test]
    fn flexible_date_accepts_timestamps() {
        assert_eq!(
            flexible_date::parse("2026-02-14T10:00:00Z"),
            NaiveDate::from_ymd_opt(2026, 2, 14)
        );
        assert_eq!(flexible_date::parse("14/02/2026"), None);
    }

    #[test]
    fn wire_timestamp_converts() {
        let ts = WireTimestamp {
            seconds: 1_700_000_000,
            nanoseconds: 0,
        };
        assert_eq!(ts.to_datetime().unwrap().timestamp(), 1_700_000_000);
    }
}
