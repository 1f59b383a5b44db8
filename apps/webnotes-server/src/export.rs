//! Markdown export
//!
//! The report groups annotations by hostname, in the order each host first
//! appears:
//!
//! ```text
//! # WebNotes Export
//!
//! Exported: 2024-03-15 12:00:00 UTC
//! Total: 2 annotations
//!
//! ---
//!
//! ## example.com
//!
//! > quoted text
//!
//! **Note:** the note
//!
//! _3 hours ago - [Source](https://example.com/post)_
//!
//! ---
//! ```
//!
//! [`parse_report`] reads a report back into entries.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::annotations::AnnotationRecord;
use crate::browse::{format_relative_time, hostname};

pub const REPORT_TITLE: &str = "# WebNotes Export";
const NOTE_PREFIX: &str = "**Note:** ";
const SOURCE_LINK: &str = " - [Source](";
const SEPARATOR: &str = "---";

/// Render the markdown report
pub fn render_report(records: &[AnnotationRecord], now: DateTime<Utc>) -> String {
    let mut md = String::new();
    md.push_str(REPORT_TITLE);
    md.push_str("\n\n");
    md.push_str(&format!("Exported: {}\n", now.format("%Y-%m-%d %H:%M:%S UTC")));
    md.push_str(&format!("Total: {} annotations\n\n{}\n\n", records.len(), SEPARATOR));

    for (host, items) in group_by_host(records) {
        md.push_str(&format!("## {}\n\n", host));

        for record in items {
            for line in record.text.lines() {
                if line.is_empty() {
                    md.push_str(">\n");
                } else {
                    md.push_str(&format!("> {}\n", line));
                }
            }
            md.push('\n');

            if let Some(note) = &record.note {
                md.push_str(NOTE_PREFIX);
                md.push_str(note);
                md.push_str("\n\n");
            }

            md.push_str(&format!(
                "_{}{}{})_\n\n{}\n\n",
                format_relative_time(record.created_at, now),
                SOURCE_LINK,
                record.url,
                SEPARATOR
            ));
        }
    }

    md
}

/// Suggested download name, e.g. `webnotes-2024-03-15.md`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("webnotes-{}.md", now.format("%Y-%m-%d"))
}

fn group_by_host(records: &[AnnotationRecord]) -> Vec<(String, Vec<&AnnotationRecord>)> {
    let mut groups: Vec<(String, Vec<&AnnotationRecord>)> = Vec::new();
    for record in records {
        let host = hostname(&record.url);
        match groups.iter_mut().find(|(h, _)| *h == host) {
            Some((_, items)) => items.push(record),
            None => groups.push((host, vec![record])),
        }
    }
    groups
}

/// One annotation read back from a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub host: String,
    pub text: String,
    pub note: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Not a WebNotes export: missing title line")]
    MissingHeader,

    #[error("Line {line}: annotation outside of a site section")]
    EntryOutsideSection { line: usize },

    #[error("Line {line}: malformed annotation entry")]
    MalformedEntry { line: usize },
}

#[derive(Default)]
struct PendingEntry {
    quote: Vec<String>,
    note: Option<Vec<String>>,
}

impl PendingEntry {
    fn is_empty(&self) -> bool {
        self.quote.is_empty() && self.note.is_none()
    }
}

/// Parse a report produced by [`render_report`]
pub fn parse_report(markdown: &str) -> Result<Vec<ReportEntry>, ReportError> {
    let mut lines = markdown.lines().enumerate().map(|(i, l)| (i + 1, l));

    match lines.by_ref().find(|(_, l)| !l.trim().is_empty()) {
        Some((_, title)) if title.trim() == REPORT_TITLE => {}
        _ => return Err(ReportError::MissingHeader),
    }

    let mut entries = Vec::new();
    let mut host: Option<String> = None;
    let mut pending = PendingEntry::default();
    let mut last_line = 0;

    for (number, line) in lines {
        last_line = number;

        // Note text runs until the source line and may span lines.
        if let Some(note) = pending.note.as_mut() {
            if !is_source_line(line) {
                note.push(line.to_string());
                continue;
            }
        }

        if let Some(name) = line.strip_prefix("## ") {
            if !pending.is_empty() {
                return Err(ReportError::MalformedEntry { line: number });
            }
            host = Some(name.trim().to_string());
        } else if line == ">" || line.starts_with("> ") {
            if host.is_none() {
                return Err(ReportError::EntryOutsideSection { line: number });
            }
            let text = line.strip_prefix("> ").unwrap_or_default();
            pending.quote.push(text.to_string());
        } else if let Some(first) = line.strip_prefix(NOTE_PREFIX) {
            if pending.quote.is_empty() {
                return Err(ReportError::MalformedEntry { line: number });
            }
            pending.note = Some(vec![first.to_string()]);
        } else if is_source_line(line) {
            let (Some(site), false) = (host.as_ref(), pending.quote.is_empty()) else {
                return Err(ReportError::MalformedEntry { line: number });
            };
            let url = source_url(line).ok_or(ReportError::MalformedEntry { line: number })?;
            let entry = std::mem::take(&mut pending);
            entries.push(ReportEntry {
                host: site.clone(),
                text: entry.quote.join("\n"),
                note: entry
                    .note
                    .map(|n| n.join("\n").trim().to_string())
                    .filter(|n| !n.is_empty()),
                url,
            });
        } else if line.trim().is_empty() || line.trim() == SEPARATOR {
            continue;
        } else if host.is_some() {
            return Err(ReportError::MalformedEntry { line: number });
        }
        // Preamble lines (export time, count) are skipped.
    }

    if !pending.is_empty() {
        return Err(ReportError::MalformedEntry { line: last_line });
    }
    Ok(entries)
}

fn is_source_line(line: &str) -> bool {
    line.starts_with('_') && line.ends_with(")_") && line.contains(SOURCE_LINK)
}

fn source_url(line: &str) -> Option<String> {
    let start = line.find(SOURCE_LINK)? + SOURCE_LINK.len();
    let end = line.len().checked_sub(2)?;
    (start <= end).then(|| line[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{NewAnnotation, PageInfo};
    use crate::highlight::Color;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn record(text: &str, note: Option<&str>, url: &str, age: Duration) -> AnnotationRecord {
        let page = PageInfo::new(url, "Title");
        let draft = match note {
            Some(n) => NewAnnotation::note(text, n, Color::Green, None, &page),
            None => NewAnnotation::highlight(text, Color::Green, None, &page),
        };
        draft.into_record(format!("id-{}", text.len()), now() - age)
    }

    #[test]
    fn test_render_report() {
        let records = vec![
            record("first quote", None, "https://a.example/one", Duration::hours(3)),
            record("second quote", Some("my note"), "https://b.example/", Duration::days(10)),
            record("third quote", None, "https://a.example/two", Duration::seconds(5)),
        ];

        let md = render_report(&records, now());

        let expected = "# WebNotes Export\n\
            \n\
            Exported: 2024-03-15 12:00:00 UTC\n\
            Total: 3 annotations\n\
            \n\
            ---\n\
            \n\
            ## a.example\n\
            \n\
            > first quote\n\
            \n\
            _3 hours ago - [Source](https://a.example/one)_\n\
            \n\
            ---\n\
            \n\
            > third quote\n\
            \n\
            _just now - [Source](https://a.example/two)_\n\
            \n\
            ---\n\
            \n\
            ## b.example\n\
            \n\
            > second quote\n\
            \n\
            **Note:** my note\n\
            \n\
            _2024-03-05 - [Source](https://b.example/)_\n\
            \n\
            ---\n\
            \n";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_report_round_trip() {
        let records = vec![
            record("line one\n\nline three", None, "https://a.example/x", Duration::minutes(2)),
            record("quote", Some("note line\nsecond line"), "https://b.example/y?q=1", Duration::hours(1)),
            record("plain", None, "https://a.example/z", Duration::days(1)),
        ];

        let entries = parse_report(&render_report(&records, now())).unwrap();

        assert_eq!(
            entries,
            vec![
                ReportEntry {
                    host: "a.example".to_string(),
                    text: "line one\n\nline three".to_string(),
                    note: None,
                    url: "https://a.example/x".to_string(),
                },
                ReportEntry {
                    host: "a.example".to_string(),
                    text: "plain".to_string(),
                    note: None,
                    url: "https://a.example/z".to_string(),
                },
                ReportEntry {
                    host: "b.example".to_string(),
                    text: "quote".to_string(),
                    note: Some("note line\nsecond line".to_string()),
                    url: "https://b.example/y?q=1".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_empty_report() {
        let md = render_report(&[], now());

        assert!(md.contains("Total: 0 annotations"));
        assert_eq!(parse_report(&md).unwrap(), Vec::new());
    }

    #[test]
    fn test_parse_rejects_foreign_markdown() {
        assert_eq!(parse_report("# Something else\n"), Err(ReportError::MissingHeader));
        assert_eq!(parse_report(""), Err(ReportError::MissingHeader));
    }

    #[test]
    fn test_parse_rejects_broken_entries() {
        let orphan = "# WebNotes Export\n\n> quote without a site\n";
        assert_eq!(
            parse_report(orphan),
            Err(ReportError::EntryOutsideSection { line: 3 })
        );

        let unterminated = "# WebNotes Export\n\n## a.example\n\n> dangling\n";
        assert_eq!(
            parse_report(unterminated),
            Err(ReportError::MalformedEntry { line: 5 })
        );
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(now()), "webnotes-2024-03-15.md");
    }
}
