//! Bulk text import.
//!
//! One record per line, segments separated by `;`:
//!
//! ```text
//! # comment
//! var1:111,var2:222;13800138000,13800138001
//! var1:111,var2:222;2023-11-11 11:11:11;13800138000,13800138001
//! var1:111,var2:222;2023-11-11 11:11:11;13800138000,13800138001;1
//! ```
//!
//! An empty time segment means "send immediately"; a retry count of zero means unset.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::{FieldValue, SendItem, SendSchedule, SEND_TIME_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct BulkParseError {
    /// 1-based line number in the submitted text.
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected 2 to 4 `;`-separated segments, found {0}")]
    SegmentCount(usize),
    #[error("field `{0}` is not a `name:value` pair")]
    MalformedField(String),
    #[error("invalid send time `{0}`, expected YYYY-MM-DD HH:MM:SS")]
    InvalidTime(String),
    #[error("no destinations")]
    NoDestinations,
    #[error("{0}")]
    InvalidDestination(String),
    #[error("invalid retry count `{0}`")]
    InvalidRetries(String),
}

/// Parses bulk text into pending send items.
///
/// `validate_destination` is called for every destination; its error text is
/// reported as [`ParseErrorKind::InvalidDestination`]. The first malformed line
/// aborts the parse.
pub fn parse_bulk<F>(text: &str, validate_destination: F) -> Result<Vec<SendItem>, BulkParseError>
where
    F: Fn(&str) -> Result<(), String>,
{
    let mut items = Vec::new();
    for (offset, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let item = parse_line(line, &validate_destination).map_err(|kind| BulkParseError {
            line: offset + 1,
            kind,
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Mainland China mobile number: 11 digits starting with `1`.
pub fn validate_mobile(value: &str) -> Result<(), String> {
    let ok = value.len() == 11
        && value.starts_with('1')
        && value.bytes().all(|b| b.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(format!("{value} is not a mobile number"))
    }
}

fn parse_line<F>(line: &str, validate_destination: &F) -> Result<SendItem, ParseErrorKind>
where
    F: Fn(&str) -> Result<(), String>,
{
    let segments: Vec<&str> = line.split(';').map(str::trim).collect();
    let (fields, time, dests, retries) = match segments.as_slice() {
        [fields, dests] => (*fields, "", *dests, ""),
        [fields, time, dests] => (*fields, *time, *dests, ""),
        [fields, time, dests, retries] => (*fields, *time, *dests, *retries),
        other => return Err(ParseErrorKind::SegmentCount(other.len())),
    };

    let field_values = parse_fields(fields)?;
    let schedule = parse_time(time)?;
    let destinations = parse_destinations(dests, validate_destination)?;
    let max_retries = parse_retries(retries)?;

    Ok(SendItem {
        field_values,
        destinations,
        schedule,
        max_retries,
        ..SendItem::default()
    })
}

fn parse_fields(segment: &str) -> Result<Vec<FieldValue>, ParseErrorKind> {
    segment
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok(FieldValue::new(name.trim(), value.trim()))
            }
            _ => Err(ParseErrorKind::MalformedField(pair.to_string())),
        })
        .collect()
}

fn parse_time(segment: &str) -> Result<SendSchedule, ParseErrorKind> {
    if segment.is_empty() {
        return Ok(SendSchedule::Now);
    }
    NaiveDateTime::parse_from_str(segment, SEND_TIME_FORMAT)
        .map(SendSchedule::At)
        .map_err(|_| ParseErrorKind::InvalidTime(segment.to_string()))
}

fn parse_destinations<F>(segment: &str, validate: &F) -> Result<Vec<String>, ParseErrorKind>
where
    F: Fn(&str) -> Result<(), String>,
{
    let destinations: Vec<String> = segment
        .split(',')
        .map(str::trim)
        .filter(|dest| !dest.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if destinations.is_empty() {
        return Err(ParseErrorKind::NoDestinations);
    }
    for dest in &destinations {
        validate(dest).map_err(ParseErrorKind::InvalidDestination)?;
    }
    Ok(destinations)
}

fn parse_retries(segment: &str) -> Result<Option<u32>, ParseErrorKind> {
    if segment.is_empty() {
        return Ok(None);
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseErrorKind::InvalidRetries(segment.to_string()));
    }
    segment
        .parse::<u32>()
        .map(|n| (n > 0).then_some(n))
        .map_err(|_| ParseErrorKind::InvalidRetries(segment.to_string()))
}
