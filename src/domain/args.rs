//! Typed tool arguments. Each struct can only be built by parsing a raw
//! argument bag, so a handler holding one never sees invalid input.

use serde_json::{Map, Value as JsonValue};

use crate::core::error::ToolFault;

pub const DEFAULT_IMAGE_LIMIT: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnThisDayArgs {
    /// Accepted but unused: the provider only indexes by month and day.
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindPageArgs {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPageArgs {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetImagesArgs {
    pub title: String,
    pub limit: i64,
}

fn fields(arguments: &JsonValue) -> Map<String, JsonValue> {
    arguments.as_object().cloned().unwrap_or_default()
}

fn non_blank<'a>(fields: &'a Map<String, JsonValue>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// `YYYY-MM-DD` with ASCII digits, nothing more and nothing less.
fn split_date(date: &str) -> Option<(u16, u8, u8)> {
    let b = date.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    let digits = |r: std::ops::Range<usize>| b[r].iter().all(u8::is_ascii_digit);
    if !(digits(0..4) && digits(5..7) && digits(8..10)) {
        return None;
    }
    Some((date[0..4].parse().ok()?, date[5..7].parse().ok()?, date[8..10].parse().ok()?))
}

/// Integer prefix of a string, ignoring leading whitespace.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse().ok()
}

/// `limit` may arrive as a number or a string; anything that does not read as
/// an integer falls back to the default.
fn parse_limit(value: Option<&JsonValue>) -> i64 {
    match value {
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(DEFAULT_IMAGE_LIMIT),
        Some(JsonValue::String(s)) => leading_integer(s).unwrap_or(DEFAULT_IMAGE_LIMIT),
        _ => DEFAULT_IMAGE_LIMIT,
    }
}

impl TryFrom<&JsonValue> for OnThisDayArgs {
    type Error = ToolFault;

    fn try_from(arguments: &JsonValue) -> Result<Self, Self::Error> {
        let fields = fields(arguments);
        fields
            .get("date")
            .and_then(|v| v.as_str())
            .and_then(split_date)
            .map(|(year, month, day)| OnThisDayArgs { year, month, day })
            .ok_or_else(|| {
                ToolFault::InvalidParams(r#"Invalid onThisDay arguments. Expected { date: "YYYY-MM-DD" }"#.into())
            })
    }
}

impl TryFrom<&JsonValue> for FindPageArgs {
    type Error = ToolFault;

    fn try_from(arguments: &JsonValue) -> Result<Self, Self::Error> {
        let fields = fields(arguments);
        let query = non_blank(&fields, "query").ok_or_else(|| {
            ToolFault::InvalidParams("Invalid findPage arguments. Expected { query: string }".into())
        })?;
        Ok(FindPageArgs { query: query.to_owned() })
    }
}

impl TryFrom<&JsonValue> for GetPageArgs {
    type Error = ToolFault;

    fn try_from(arguments: &JsonValue) -> Result<Self, Self::Error> {
        let fields = fields(arguments);
        let title = non_blank(&fields, "title").ok_or_else(|| {
            ToolFault::InvalidParams("Invalid getPage arguments. Expected { title: string }".into())
        })?;
        Ok(GetPageArgs { title: title.to_owned() })
    }
}

impl TryFrom<&JsonValue> for GetImagesArgs {
    type Error = ToolFault;

    fn try_from(arguments: &JsonValue) -> Result<Self, Self::Error> {
        let fields = fields(arguments);
        let title = non_blank(&fields, "title").ok_or_else(|| {
            ToolFault::InvalidParams("Invalid getImagesForPage arguments. Expected { title: string }".into())
        })?;
        Ok(GetImagesArgs { title: title.to_owned(), limit: parse_limit(fields.get("limit")) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn date_extracts_month_and_day() {
        let a = OnThisDayArgs::try_from(&json!({"date": "1879-03-14"})).unwrap();
        assert_eq!(a, OnThisDayArgs { year: 1879, month: 3, day: 14 });
    }

    #[test]
    fn malformed_dates_are_invalid_params() {
        for bad in [
            json!({"date": "2024-1-05"}),
            json!({"date": "20240105"}),
            json!({"date": "2024-01-05T00:00"}),
            json!({"date": " 2024-01-05"}),
            json!({"date": "abcd-ef-gh"}),
            json!({"date": "２０２４-01-05"}),
            json!({"date": 20240105}),
            json!({}),
            json!(null),
            json!("2024-01-05"),
        ] {
            let err = OnThisDayArgs::try_from(&bad).unwrap_err();
            assert_eq!(err.code(), -32602, "expected invalid params for {bad}");
        }
    }

    #[test]
    fn pattern_only_checks_shape() {
        // Out-of-range months pass the shape check; the provider rejects them.
        let a = OnThisDayArgs::try_from(&json!({"date": "2024-13-40"})).unwrap();
        assert_eq!((a.month, a.day), (13, 40));
    }

    #[test]
    fn blank_query_and_title_are_rejected() {
        for blank in ["", "   ", "\t\n"] {
            assert!(FindPageArgs::try_from(&json!({"query": blank})).is_err());
            assert!(GetPageArgs::try_from(&json!({"title": blank})).is_err());
            assert!(GetImagesArgs::try_from(&json!({"title": blank})).is_err());
        }
        assert!(FindPageArgs::try_from(&json!({"query": 42})).is_err());
        assert!(GetPageArgs::try_from(&json!({})).is_err());
    }

    #[test]
    fn query_is_passed_through_untrimmed() {
        let a = FindPageArgs::try_from(&json!({"query": " Albert Einstein "})).unwrap();
        assert_eq!(a.query, " Albert Einstein ");
    }

    #[test]
    fn limit_defaults_and_parses() {
        let parse = |v: JsonValue| GetImagesArgs::try_from(&v).unwrap().limit;
        assert_eq!(parse(json!({"title": "X"})), 50);
        assert_eq!(parse(json!({"title": "X", "limit": 120})), 120);
        assert_eq!(parse(json!({"title": "X", "limit": "7"})), 7);
        assert_eq!(parse(json!({"title": "X", "limit": "12abc"})), 12);
        assert_eq!(parse(json!({"title": "X", "limit": 12.9})), 12);
        assert_eq!(parse(json!({"title": "X", "limit": "abc"})), 50);
        assert_eq!(parse(json!({"title": "X", "limit": null})), 50);
        assert_eq!(parse(json!({"title": "X", "limit": true})), 50);
        assert_eq!(parse(json!({"title": "X", "limit": 0})), 0);
        assert_eq!(parse(json!({"title": "X", "limit": "-3"})), -3);
    }
}
