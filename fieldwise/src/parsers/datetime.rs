//! Date-time parsing: ISO and RFC forms, common layouts and a few
//! natural-language expressions.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use serde_json::Value as JsonValue;

use crate::engine::Engine;
use crate::error::{Cause, Result};
use crate::path::FieldPath;
use crate::registry::TypeParser;
use crate::ty::Ty;
use crate::value::Value;

/// Layouts that carry their own offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
];

/// Layouts without an offset; read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only layouts; read as midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%d %b %Y",
];

/// Parses text into a timezone-aware instant.
///
/// Relative expressions (`now`, `today`, `3 days ago`, `in 2 hours`) are
/// resolved against the reference instant, which defaults to the current
/// time. Text that matches nothing is a value error; non-text is a type
/// error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateTimeParser {
    reference: Option<DateTime<FixedOffset>>,
}

impl DateTimeParser {
    /// A parser resolving relative expressions against the current time.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser resolving relative expressions against `reference`.
    pub fn with_reference(reference: DateTime<FixedOffset>) -> Self {
        Self {
            reference: Some(reference),
        }
    }

    fn reference(&self) -> DateTime<FixedOffset> {
        self.reference.unwrap_or_else(|| Utc::now().fixed_offset())
    }

    /// Parses `text`, or `None` if no layout or expression matches.
    pub fn parse_text(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt);
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
            return Some(dt);
        }
        for format in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(text, format) {
                return Some(dt);
            }
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Some(naive.and_utc().fixed_offset());
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Some(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
            }
        }
        self.parse_relative(&text.to_lowercase())
    }

    fn parse_relative(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let reference = self.reference();
        let midnight = || {
            let naive = reference.date_naive().and_time(NaiveTime::MIN);
            reference.offset().from_local_datetime(&naive).single()
        };
        match text {
            "now" => return Some(reference),
            "today" => return midnight(),
            "yesterday" => return midnight()?.checked_sub_signed(TimeDelta::try_days(1)?),
            "tomorrow" => return midnight()?.checked_add_signed(TimeDelta::try_days(1)?),
            _ => {}
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        match words.as_slice() {
            [amount, unit, "ago"] => {
                reference.checked_sub_signed(delta(amount.parse().ok()?, unit)?)
            }
            ["in", amount, unit] => {
                reference.checked_add_signed(delta(amount.parse().ok()?, unit)?)
            }
            _ => None,
        }
    }
}

fn delta(amount: i64, unit: &str) -> Option<TimeDelta> {
    match unit.strip_suffix('s').unwrap_or(unit) {
        "second" | "sec" => TimeDelta::try_seconds(amount),
        "minute" | "min" => TimeDelta::try_minutes(amount),
        "hour" => TimeDelta::try_hours(amount),
        "day" => TimeDelta::try_days(amount),
        "week" => TimeDelta::try_weeks(amount),
        _ => None,
    }
}

impl TypeParser for DateTimeParser {
    fn parse(&self, _: &Engine, value: &JsonValue, _: &Ty, _: &FieldPath) -> Result<Value> {
        let JsonValue::String(text) = value else {
            return Err(Cause::mismatch("date-time text", value).into());
        };
        self.parse_text(text)
            .map(Value::DateTime)
            .ok_or_else(|| Cause::value(format!("could not parse {text:?} as a date-time")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned() -> DateTimeParser {
        let reference = DateTime::parse_from_rfc3339("2024-03-10T15:30:00+00:00").unwrap();
        DateTimeParser::with_reference(reference)
    }

    fn rfc3339(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn iso_forms_keep_their_offset() {
        let parser = pinned();
        let dt = parser.parse_text("2020-01-02T03:04:05+02:00").unwrap();
        assert_eq!(dt, rfc3339("2020-01-02T01:04:05Z"));
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);

        assert_eq!(
            parser.parse_text("2020-01-02 03:04:05 +0100"),
            Some(rfc3339("2020-01-02T03:04:05+01:00"))
        );
    }

    #[test]
    fn naive_forms_are_utc() {
        let parser = pinned();
        assert_eq!(
            parser.parse_text("2020-01-02 03:04"),
            Some(rfc3339("2020-01-02T03:04:00Z"))
        );
        assert_eq!(
            parser.parse_text("2020-01-02"),
            Some(rfc3339("2020-01-02T00:00:00Z"))
        );
        assert_eq!(
            parser.parse_text("March 5, 2021"),
            Some(rfc3339("2021-03-05T00:00:00Z"))
        );
        assert_eq!(
            parser.parse_text("Tue, 1 Jul 2003 10:52:37 +0200"),
            Some(rfc3339("2003-07-01T10:52:37+02:00"))
        );
    }

    #[test]
    fn relative_forms_use_the_reference() {
        let parser = pinned();
        assert_eq!(parser.parse_text("now"), Some(rfc3339("2024-03-10T15:30:00Z")));
        assert_eq!(parser.parse_text("Today"), Some(rfc3339("2024-03-10T00:00:00Z")));
        assert_eq!(
            parser.parse_text("yesterday"),
            Some(rfc3339("2024-03-09T00:00:00Z"))
        );
        assert_eq!(
            parser.parse_text("2 days ago"),
            Some(rfc3339("2024-03-08T15:30:00Z"))
        );
        assert_eq!(
            parser.parse_text("in 1 week"),
            Some(rfc3339("2024-03-17T15:30:00Z"))
        );
        assert_eq!(
            parser.parse_text("in 90 minutes"),
            Some(rfc3339("2024-03-10T17:00:00Z"))
        );
    }

    #[test]
    fn failures_distinguish_shape_from_content() {
        let parser = pinned();
        let engine = Engine::new();
        let path = FieldPath::root();

        let garbage = parser.parse(&engine, &JsonValue::from("next blue moon"), &Ty::DateTime, &path);
        assert!(matches!(garbage, Err(crate::Error::Invalid(Cause::Value(_)))));

        let number = parser.parse(&engine, &JsonValue::from(12), &Ty::DateTime, &path);
        assert!(matches!(number, Err(crate::Error::Invalid(Cause::Type(_)))));
    }
}
