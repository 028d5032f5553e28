// Primitives for reading the summary files.
//
// Only the generation date is needed out of the summary, the rest of the document is not read.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use crate::publish::*;

static GENERATED_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<GeneratedDate>\s*(.*?)\s*</GeneratedDate>").expect("valid regex")
});

// Tried in this order when the date has no offset. Such dates are read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

pub fn read_generated_at(path: &str) -> BuildResult<Timestamp> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let value = extract_generated_date(&contents).context(MissingTimestampSnafu { path })?;
    debug!("read_generated_at: {:?} in {}", value, path);
    parse_timestamp(value).context(InvalidTimestampSnafu { path, value })
}

fn extract_generated_date(xml: &str) -> Option<&str> {
    let caps = GENERATED_DATE_RE.captures(xml)?;
    caps.get(1).map(|m| m.as_str())
}

pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}
