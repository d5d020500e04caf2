// Copyright 2025 Procflow Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Delimited event-log parsing.
//!
//! Turns raw CSV or semicolon-delimited text into validated events sorted
//! globally by timestamp. Header matching is defensive on purpose:
//! real-world exports disagree on column naming, quoting, delimiters, and
//! sometimes hide control characters in the header row, so headers are
//! normalized and then matched by substring against known aliases.
//!
//! Row-level failures (unparseable timestamp, blank case id or activity)
//! drop the row and nothing else. A log where every row is dropped is an
//! error; so is a payload that turns out to be an HTML error page.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::error::{ProcflowError, Result};
use crate::event::Event;

/// Accepted header aliases for the case identifier column
const CASE_ALIASES: &[&str] = &["case id", "caseid", "case_id"];

/// Accepted header aliases for the activity column
const ACTIVITY_ALIASES: &[&str] = &["activity", "actividad"];

/// Accepted header aliases for the timestamp column
const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "fecha"];

/// Accepted header aliases for the optional resource column
const RESOURCE_ALIASES: &[&str] = &["resource", "recurso"];

/// Timestamp formats accepted in addition to RFC 3339
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Column indices resolved from the header row
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    case_id: usize,
    activity: usize,
    timestamp: usize,
    resource: Option<usize>,
}

/// Parse raw log text into events sorted ascending by timestamp.
///
/// The sort is stable, so rows sharing a timestamp keep their input order;
/// per-case trace ordering and the global span both depend on this.
pub fn parse_log(raw: &str) -> Result<Vec<Event>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProcflowError::EmptyInput);
    }
    if looks_like_html(trimmed) {
        return Err(ProcflowError::HtmlPayload);
    }

    let lines: Vec<&str> = trimmed.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(ProcflowError::TooFewLines);
    }

    let delimiter = detect_delimiter(lines[0]);
    let columns = resolve_columns(lines[0], delimiter)?;

    let mut events = Vec::with_capacity(lines.len() - 1);
    let mut dropped = 0usize;
    for line in &lines[1..] {
        match parse_row(line, delimiter, &columns) {
            Some(event) => events.push(event),
            None => dropped += 1,
        }
    }

    if events.is_empty() {
        return Err(ProcflowError::EmptyLog { dropped });
    }
    if dropped > 0 {
        warn!(dropped, kept = events.len(), "Dropped malformed event rows");
    }

    events.sort_by_key(|e| e.timestamp);

    debug!(event_count = events.len(), "Parsed event log");
    Ok(events)
}

/// An HTML payload means a fetch for a missing resource came back as an
/// error page instead of log data.
fn looks_like_html(text: &str) -> bool {
    let head: String = text.chars().take(64).collect::<String>().to_lowercase();
    head.starts_with("<!doctype")
        || head.starts_with("<html")
        || head.starts_with("<head")
        || head.starts_with("<body")
}

/// Use `;` only when the header carries semicolons and no commas; comma
/// wins otherwise.
fn detect_delimiter(header: &str) -> char {
    if header.contains(';') && !header.contains(',') {
        ';'
    } else {
        ','
    }
}

/// Strip control characters and surrounding quotes, then lowercase.
fn normalize_header(cell: &str) -> String {
    let cleaned: String = cell.chars().filter(|c| !c.is_control()).collect();
    cleaned
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|alias| h.contains(alias)))
}

fn resolve_columns(header_line: &str, delimiter: char) -> Result<ColumnMap> {
    let headers: Vec<String> = header_line.split(delimiter).map(normalize_header).collect();

    let case_id = find_column(&headers, CASE_ALIASES);
    let activity = find_column(&headers, ACTIVITY_ALIASES);
    let timestamp = find_column(&headers, TIMESTAMP_ALIASES);

    match (case_id, activity, timestamp) {
        (Some(case_id), Some(activity), Some(timestamp)) => Ok(ColumnMap {
            case_id,
            activity,
            timestamp,
            resource: find_column(&headers, RESOURCE_ALIASES),
        }),
        _ => {
            let mut missing = Vec::new();
            if case_id.is_none() {
                missing.push("case id");
            }
            if activity.is_none() {
                missing.push("activity");
            }
            if timestamp.is_none() {
                missing.push("timestamp");
            }
            Err(ProcflowError::MissingColumns(missing.join(", ")))
        }
    }
}

/// Parse one data row, or drop it when the required cells are unusable.
fn parse_row(line: &str, delimiter: char, columns: &ColumnMap) -> Option<Event> {
    let cells: Vec<&str> = line.split(delimiter).collect();

    let case_id = cells.get(columns.case_id)?.trim();
    let activity = cells.get(columns.activity)?.trim();
    if case_id.is_empty() || activity.is_empty() {
        return None;
    }
    let timestamp = parse_timestamp(cells.get(columns.timestamp)?)?;

    let resource = columns
        .resource
        .and_then(|idx| cells.get(idx))
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .map(str::to_owned);

    Some(Event {
        case_id: case_id.to_owned(),
        activity: activity.to_owned(),
        resource,
        timestamp,
    })
}

/// Parse a timestamp cell: RFC 3339 first, then the common export formats,
/// then a bare date treated as midnight UTC.
fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    let cell = cell.trim().trim_matches('"');
    if cell.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(cell) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(parse_log(""), Err(ProcflowError::EmptyInput)));
        assert!(matches!(parse_log("  \n\t "), Err(ProcflowError::EmptyInput)));
    }

    #[test]
    fn test_header_only_rejected() {
        let result = parse_log("Case ID,Activity,Timestamp\n");
        assert!(matches!(result, Err(ProcflowError::TooFewLines)));
    }

    #[test]
    fn test_html_payload_rejected() {
        let page = "<!DOCTYPE html>\n<html><body>404 Not Found</body></html>";
        assert!(matches!(parse_log(page), Err(ProcflowError::HtmlPayload)));
        assert!(matches!(
            parse_log("<html lang=\"en\"><body>nope</body></html>"),
            Err(ProcflowError::HtmlPayload)
        ));
    }

    #[test]
    fn test_missing_columns_rejected() {
        let result = parse_log("foo,bar,baz\n1,2,3");
        match result {
            Err(ProcflowError::MissingColumns(missing)) => {
                assert_eq!(missing, "case id, activity, timestamp");
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_basic_comma_log() {
        let raw = "Case ID,Activity,Timestamp\n\
                   A,Start,2025-01-01T00:00:00\n\
                   A,End,2025-01-01T02:00:00\n\
                   B,Start,2025-01-01T01:00:00";
        let events = parse_log(raw).unwrap();
        assert_eq!(events.len(), 3);
        // globally sorted by timestamp
        assert_eq!(events[0].case_id, "A");
        assert_eq!(events[1].case_id, "B");
        assert_eq!(events[2].activity, "End");
    }

    #[test]
    fn test_semicolon_detection_with_spanish_headers() {
        let raw = "Case ID;Actividad;Fecha\n\
                   C-1;Recepción;2025-03-01 09:00:00\n\
                   C-1;Entrega;2025-03-02 09:00:00";
        let events = parse_log(raw).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].activity, "Recepción");
    }

    #[test]
    fn test_comma_wins_when_both_present() {
        // a header like "Case ID,Notes;misc,..." must not flip to semicolons
        let raw = "Case ID,Activity;notes,Timestamp\n\
                   A,Start,2025-01-01T00:00:00";
        let events = parse_log(raw).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_header_normalization() {
        let raw = "\"Case ID\",\u{feff}ACTIVITY,\"Timestamp\"\n\
                   A,Start,2025-01-01T00:00:00";
        let events = parse_log(raw).unwrap();
        assert_eq!(events[0].case_id, "A");
    }

    #[test]
    fn test_resource_column_is_optional() {
        let raw = "Case ID,Activity,Resource,Timestamp\n\
                   A,Start,alice,2025-01-01T00:00:00\n\
                   A,End,,2025-01-01T01:00:00";
        let events = parse_log(raw).unwrap();
        assert_eq!(events[0].resource.as_deref(), Some("alice"));
        assert_eq!(events[1].resource, None);
    }

    #[test]
    fn test_malformed_rows_dropped_silently() {
        let raw = "Case ID,Activity,Timestamp\n\
                   A,Start,2025-01-01T00:00:00\n\
                   ,Orphan,2025-01-01T00:30:00\n\
                   B,,2025-01-01T00:40:00\n\
                   C,Broken,not-a-date\n\
                   A,End,2025-01-01T02:00:00";
        let events = parse_log(raw).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_all_rows_dropped_is_fatal() {
        let raw = "Case ID,Activity,Timestamp\n\
                   ,x,2025-01-01T00:00:00\n\
                   y,,bad";
        match parse_log(raw) {
            Err(ProcflowError::EmptyLog { dropped }) => assert_eq!(dropped, 2),
            other => panic!("expected EmptyLog, got {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_formats() {
        for cell in [
            "2025-01-01T00:00:00",
            "2025-01-01 00:00:00",
            "2025-01-01T00:00:00Z",
            "2025-01-01T00:00:00+00:00",
            "2025-01-01T00:00",
            "2025-01-01 00:00",
            "2025-01-01",
        ] {
            let parsed = parse_timestamp(cell);
            assert!(parsed.is_some(), "failed to parse {cell}");
            assert_eq!(
                parsed.unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .and_utc()
            );
        }
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_stable_sort_for_equal_timestamps() {
        let raw = "Case ID,Activity,Timestamp\n\
                   A,First,2025-01-01T00:00:00\n\
                   B,Second,2025-01-01T00:00:00\n\
                   C,Third,2025-01-01T00:00:00";
        let events = parse_log(raw).unwrap();
        let order: Vec<&str> = events.iter().map(|e| e.activity.as_str()).collect();
        assert_eq!(order, ["First", "Second", "Third"]);
    }
}
