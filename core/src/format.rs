//! Utility functions for turning sensor readings into the status line.
//!
//! A status line is described by a template such as
//! `"cpu {cpu}% | {bat_status} {bat_capacity}% | {time}"`. Templates are
//! parsed once at startup; rendering asks a [`FieldSource`] for each
//! placeholder and substitutes `?` for values that are not available yet.

use crate::SensorError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::fmt::{Display, Write};
use std::sync::LazyLock;

/// Text substituted for a placeholder whose value is unknown.
pub const MISSING: &str = "?";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z_]+?)(\d*)\}").expect("placeholder pattern is valid")
});

/// A value a template can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// CPU usage of a slot: 0 is the aggregate, N is core N
    Cpu(usize),
    MemUsed,
    MemTotal,
    MemAvail,
    MemPct,
    /// Temperature of the Nth configured sensor
    Temp(usize),
    Essid,
    Bitrate,
    BatStatus,
    BatCapacity,
    Time,
}

impl Field {
    fn from_parts(name: &str, index: &str) -> Option<Self> {
        let index = if index.is_empty() {
            None
        } else {
            Some(index.parse::<usize>().ok()?)
        };

        let field = match (name, index) {
            ("cpu", None) => Self::Cpu(0),
            ("cpu", Some(0)) => return None,
            ("cpu", Some(core)) => Self::Cpu(core),
            ("temp", Some(sensor)) => Self::Temp(sensor),
            ("mem_used", None) => Self::MemUsed,
            ("mem_total", None) => Self::MemTotal,
            ("mem_avail", None) => Self::MemAvail,
            ("mem_pct", None) => Self::MemPct,
            ("essid", None) => Self::Essid,
            ("bitrate", None) => Self::Bitrate,
            ("bat_status", None) => Self::BatStatus,
            ("bat_capacity", None) => Self::BatCapacity,
            ("time", None) => Self::Time,
            _ => return None,
        };
        Some(field)
    }
}

/// Anything that can answer placeholder lookups during rendering.
pub trait FieldSource {
    /// Current text for `field`, or `None` if it is not known.
    fn value(&self, field: Field) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed status line template.
///
/// # Examples
///
/// ```rust
/// use rootstat_core::format::{Field, FieldSource, Template};
///
/// struct Fixed;
/// impl FieldSource for Fixed {
///     fn value(&self, field: Field) -> Option<String> {
///         (field == Field::Cpu(0)).then(|| "12".to_owned())
///     }
/// }
///
/// let template = Template::parse("cpu {cpu}% {time}").unwrap();
/// assert_eq!(template.render(&Fixed), "cpu 12% ?");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, rejecting unknown placeholders.
    pub fn parse(template: &str) -> Result<Self, SensorError> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let index = caps.get(2).map_or("", |m| m.as_str());
            let field = Field::from_parts(name.as_str(), index).ok_or_else(|| {
                SensorError::config_with_value("Unknown placeholder in format", whole.as_str())
            })?;

            if whole.start() > last {
                segments.push(Segment::Literal(template[last..whole.start()].to_owned()));
            }
            segments.push(Segment::Field(field));
            last = whole.end();
        }

        if last < template.len() {
            segments.push(Segment::Literal(template[last..].to_owned()));
        }

        Ok(Self { segments })
    }

    /// Every placeholder in the template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(field) => Some(*field),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template against `source`.
    #[must_use]
    pub fn render(&self, source: &impl FieldSource) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => match source.value(*field) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(MISSING),
                },
            }
        }
        out
    }
}

/// Reject strftime formats chrono cannot render.
pub fn validate_time_format(format: &str) -> Result<(), SensorError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(SensorError::config_with_value(
            "Invalid time format",
            format,
        ));
    }
    Ok(())
}

/// Format a timestamp with a strftime format.
///
/// Returns `None` if the format cannot be rendered, which
/// [`validate_time_format`] rules out for configured formats.
#[must_use]
pub fn format_time<Tz>(time: &DateTime<Tz>, format: &str) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    write!(out, "{}", time.format_with_items(StrftimeItems::new(format))).ok()?;
    Some(out)
}

/// Format the current local time.
#[must_use]
pub fn local_time(format: &str) -> Option<String> {
    format_time(&chrono::Local::now(), format)
}

/// Render a bitrate given in bits per second as whole Mb/s.
#[must_use]
pub fn bitrate_to_mbps(bits_per_second: u64) -> String {
    (bits_per_second / 1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct Values(HashMap<Field, String>);

    impl FieldSource for Values {
        fn value(&self, field: Field) -> Option<String> {
            self.0.get(&field).cloned()
        }
    }

    #[test]
    fn test_template_parses_indexed_fields() {
        let template = Template::parse("{cpu} {cpu1} {cpu12} {temp0} {temp3}").unwrap();
        let fields: Vec<_> = template.fields().collect();
        assert_eq!(
            fields,
            vec![
                Field::Cpu(0),
                Field::Cpu(1),
                Field::Cpu(12),
                Field::Temp(0),
                Field::Temp(3)
            ]
        );
    }

    #[test]
    fn test_template_rejects_unknown_and_malformed() {
        assert!(Template::parse("{volume}").is_err());
        assert!(Template::parse("{cpu0}").is_err());
        assert!(Template::parse("{temp}").is_err());
        assert!(Template::parse("{time2}").is_err());
    }

    #[test]
    fn test_template_keeps_plain_braces() {
        let template = Template::parse("{ literal } {time}").unwrap();
        let values = Values(HashMap::from([(Field::Time, "12:00".to_owned())]));
        assert_eq!(template.render(&values), "{ literal } 12:00");
    }

    #[test]
    fn test_render_substitutes_missing_values() {
        let template = Template::parse("cpu {cpu}% bat {bat_status}{bat_capacity}%").unwrap();
        let values = Values(HashMap::from([
            (Field::Cpu(0), "7".to_owned()),
            (Field::BatStatus, "C".to_owned()),
        ]));
        assert_eq!(template.render(&values), "cpu 7% bat C?%");
    }

    #[test]
    fn test_render_empty_template() {
        let template = Template::parse("").unwrap();
        assert_eq!(template.render(&Values(HashMap::new())), "");
    }

    #[test]
    fn test_time_formatting() {
        let time = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
            .and_utc();
        assert_eq!(
            format_time(&time, "%a %d %b %H:%M").as_deref(),
            Some("Sat 09 Mar 14:05")
        );
    }

    #[test]
    fn test_time_format_validation() {
        assert!(validate_time_format("%Y-%m-%d %H:%M:%S").is_ok());
        assert!(validate_time_format("%Q").is_err());
    }

    #[test]
    fn test_bitrate_to_mbps() {
        assert_eq!(bitrate_to_mbps(54_000_000), "54");
        assert_eq!(bitrate_to_mbps(999_999), "0");
    }
}
