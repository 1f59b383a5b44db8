//! Browsing saved annotations
//!
//! Read-side helpers for listing: scoping to the current page, newest-first
//! ordering, summary counts and human-friendly timestamps.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::annotations::AnnotationRecord;

/// Which annotations a list shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    /// Only annotations captured on this exact URL
    Page(String),
}

/// Records in scope, newest first
pub fn visible(records: &[AnnotationRecord], scope: &ListScope) -> Vec<AnnotationRecord> {
    let mut shown: Vec<AnnotationRecord> = records
        .iter()
        .filter(|r| match scope {
            ListScope::All => true,
            ListScope::Page(url) => &r.url == url,
        })
        .cloned()
        .collect();
    // Stable sort keeps insertion order between equal timestamps.
    shown.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    shown
}

/// Summary counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationStats {
    pub total: usize,
    pub with_note: usize,
    /// Distinct hostnames
    pub sites: usize,
}

impl AnnotationStats {
    pub fn collect(records: &[AnnotationRecord]) -> Self {
        let sites: HashSet<String> = records.iter().map(|r| hostname(&r.url)).collect();
        Self {
            total: records.len(),
            with_note: records.iter().filter(|r| r.has_note()).count(),
            sites: sites.len(),
        }
    }
}

/// Hostname of a URL, or the input unchanged when it does not parse
pub fn hostname(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}

/// "just now", "5 minutes ago", ... falling back to the date after a week
pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);

    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        plural(elapsed.num_minutes(), "minute")
    } else if elapsed.num_hours() < 24 {
        plural(elapsed.num_hours(), "hour")
    } else if elapsed.num_days() < 7 {
        plural(elapsed.num_days(), "day")
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
