//! Timestamp parsing and duration rendering for tag values and reasons.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

// `%b` also matches full month names.
const NAMED_MONTH_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%b %d %Y %H:%M:%S",
    "%b %d %Y %H:%M",
];

const NAMED_MONTH_DATES: &[&str] = &["%d %b %Y", "%b %d %Y"];

const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a tag value as a timestamp.
///
/// Accepts ISO-8601/RFC 3339 style values with either `T` or a space between
/// date and time, with or without seconds and fractional seconds, a trailing
/// `Z` or a numeric offset, and plain `YYYY-MM-DD` dates. The same shapes are
/// accepted with `/` date separators (`2020/01/01 09:30`) and in ISO basic
/// form (`20200101T090000Z`, `20200101`). Dates with a month name
/// (`1 Jan 2020`, `January 1, 2020 09:00`) are accepted too. Values without a
/// timezone are interpreted as UTC. Returns `None` for anything else.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_iso(&normalize(trimmed)).or_else(|| parse_named_month(trimmed))
}

fn parse_iso(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed);
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    let naive = value.strip_suffix(['Z', 'z']).unwrap_or(value);
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(parsed.and_utc().fixed_offset());
        }
    }
    parse_date(naive, "%Y-%m-%d")
}

fn parse_named_month(value: &str) -> Option<DateTime<FixedOffset>> {
    let words = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    for format in NAMED_MONTH_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&words, format) {
            return Some(parsed.and_utc().fixed_offset());
        }
    }
    NAMED_MONTH_DATES
        .iter()
        .find_map(|format| parse_date(&words, format))
}

fn parse_date(value: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().fixed_offset())
}

/// Rewrite slash dates, basic-form values and a space separator into extended ISO form.
fn normalize(value: &str) -> Cow<'_, str> {
    if let Some(expanded) = expand_basic(value) {
        return Cow::Owned(expanded);
    }
    let value = if value.get(4..5) == Some("/") && value.get(7..8) == Some("/") {
        Cow::Owned(format!("{}-{}-{}", &value[..4], &value[5..7], &value[8..]))
    } else {
        Cow::Borrowed(value)
    };
    if let (Some(date), Some(" "), Some(time)) =
        (value.get(..10), value.get(10..11), value.get(11..))
    {
        return Cow::Owned(format!("{date}T{time}"));
    }
    value
}

/// `YYYYMMDD[THHMM[SS]][rest]` as `YYYY-MM-DD[THH:MM[:SS]][rest]`.
fn expand_basic(value: &str) -> Option<String> {
    let date = value
        .get(..8)
        .filter(|date| date.bytes().all(|b| b.is_ascii_digit()))?;
    let mut expanded = format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..]);
    let rest = &value[8..];
    if rest.is_empty() {
        return Some(expanded);
    }

    let time = rest.strip_prefix(['T', 't'])?;
    let digits = time.bytes().take_while(u8::is_ascii_digit).count();
    let (clock, zone) = time.split_at(digits);
    match clock.len() {
        4 => expanded.push_str(&format!("T{}:{}", &clock[..2], &clock[2..])),
        6 => expanded.push_str(&format!(
            "T{}:{}:{}",
            &clock[..2],
            &clock[2..4],
            &clock[4..]
        )),
        _ => return None,
    }
    expanded.push_str(zone);
    Some(expanded)
}

/// Render a duration as `"N days, H:MM:SS"`, dropping the clock part when it is zero.
///
/// `90 days` → `"90 days"`, `1 day` → `"1 day"`, `2 days 3 hours` →
/// `"2 days, 3:00:00"`, `5 hours` → `"5:00:00"`. Sub-second precision is ignored.
pub fn format_delta(delta: TimeDelta) -> String {
    let total = delta.num_seconds();
    let days = total.div_euclid(SECONDS_PER_DAY);
    let rest = total.rem_euclid(SECONDS_PER_DAY);
    let clock = format!(
        "{}:{:02}:{:02}",
        rest / 3600,
        (rest % 3600) / 60,
        rest % 60
    );

    if days == 0 {
        return clock;
    }
    let unit = if days.abs() == 1 { "day" } else { "days" };
    if rest == 0 {
        format!("{days} {unit}")
    } else {
        format!("{days} {unit}, {clock}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn parses_space_separated_zulu() {
        assert_eq!(
            parse_timestamp("2020-01-01 10:00:00Z"),
            Some(utc(2020, 1, 1, 10, 0, 0))
        );
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = parse_timestamp("2020-01-01T19:00:00+10:00").expect("parse");
        assert_eq!(parsed, utc(2020, 1, 1, 9, 0, 0));
        assert_eq!(parsed.offset().local_minus_utc(), 10 * 3600);
    }

    #[test]
    fn naive_values_are_utc() {
        assert_eq!(
            parse_timestamp("2020-01-01T09:00:00"),
            Some(utc(2020, 1, 1, 9, 0, 0))
        );
        assert_eq!(
            parse_timestamp("2020-01-01 09:30"),
            Some(utc(2020, 1, 1, 9, 30, 0))
        );
        assert_eq!(parse_timestamp("2020-01-02"), Some(utc(2020, 1, 2, 0, 0, 0)));
    }

    #[test]
    fn parses_slash_dates() {
        assert_eq!(parse_timestamp("2020/01/01"), Some(utc(2020, 1, 1, 0, 0, 0)));
        assert_eq!(
            parse_timestamp("2020/01/01 09:30"),
            Some(utc(2020, 1, 1, 9, 30, 0))
        );
        assert_eq!(
            parse_timestamp("2020/01/01T09:30:15Z"),
            Some(utc(2020, 1, 1, 9, 30, 15))
        );
    }

    #[test]
    fn parses_month_names() {
        assert_eq!(parse_timestamp("1 Jan 2020"), Some(utc(2020, 1, 1, 0, 0, 0)));
        assert_eq!(
            parse_timestamp("Jan 1 2020 09:00"),
            Some(utc(2020, 1, 1, 9, 0, 0))
        );
        assert_eq!(
            parse_timestamp("15 march 2021 18:45:30"),
            Some(utc(2021, 3, 15, 18, 45, 30))
        );
        assert_eq!(
            parse_timestamp("January 2, 2020"),
            Some(utc(2020, 1, 2, 0, 0, 0))
        );
    }

    #[test]
    fn parses_iso_basic_form() {
        assert_eq!(
            parse_timestamp("20200101T090000Z"),
            Some(utc(2020, 1, 1, 9, 0, 0))
        );
        assert_eq!(
            parse_timestamp("20200101T0930"),
            Some(utc(2020, 1, 1, 9, 30, 0))
        );
        assert_eq!(parse_timestamp("20200101"), Some(utc(2020, 1, 1, 0, 0, 0)));

        let parsed = parse_timestamp("20200101T190000+10:00").expect("parse");
        assert_eq!(parsed, utc(2020, 1, 1, 9, 0, 0));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_timestamp("2020-01sadasda-01 10:00:00Z"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("never"), None);
        assert_eq!(parse_timestamp("2020-13-01"), None);
        assert_eq!(parse_timestamp("2020/13/01"), None);
        assert_eq!(parse_timestamp("32 Jan 2020"), None);
        assert_eq!(parse_timestamp("20200101T09"), None);
        assert_eq!(parse_timestamp("202001011"), None);
    }

    #[test]
    fn format_delta_suppresses_zero_clock() {
        assert_eq!(format_delta(TimeDelta::days(90)), "90 days");
        assert_eq!(format_delta(TimeDelta::days(1)), "1 day");
        assert_eq!(
            format_delta(TimeDelta::days(2) + TimeDelta::hours(3)),
            "2 days, 3:00:00"
        );
        assert_eq!(format_delta(TimeDelta::hours(5)), "5:00:00");
        assert_eq!(format_delta(TimeDelta::zero()), "0:00:00");
        assert_eq!(format_delta(TimeDelta::seconds(61)), "0:01:01");
    }
}
