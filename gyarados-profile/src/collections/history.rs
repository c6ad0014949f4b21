//! Browsing history: most recent first, one entry per URL, capped.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use super::{CollectionKind, CollectionManager, timestamp};
use crate::atomic;
use crate::error::{Result, StoreError};

/// Number of entries kept in `history.json`.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// One visited page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "timestamp")]
    pub time: NaiveDateTime,
    pub url: String,
    pub title: String,
}

/// `history.json`
#[derive(Debug, Clone, Copy)]
pub struct History;

impl CollectionKind for History {
    type Item = HistoryEntry;
    const FILE_NAME: &'static str = "history.json";
    const TARGET: &'static str = "HISTORY";
    const CAP: Option<usize> = Some(MAX_HISTORY_ENTRIES);
}

/// Age windows offered by the history viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAge {
    /// Same calendar day as `now`.
    Today,
    /// At most 7 days old.
    LastWeek,
    /// At most 30 days old.
    LastMonth,
}

impl HistoryAge {
    pub fn matches(self, time: NaiveDateTime, now: NaiveDateTime) -> bool {
        match self {
            HistoryAge::Today => time.date() == now.date(),
            HistoryAge::LastWeek => now - time <= Duration::days(7),
            HistoryAge::LastMonth => now - time <= Duration::days(30),
        }
    }
}

/// Record a visit: a known URL has its time and title refreshed in place,
/// a new one is inserted at the front. The list is then cut to
/// [`MAX_HISTORY_ENTRIES`].
///
/// The cut is by list position, not by time: a refreshed entry keeps its
/// slot, so one near the end is still the next to go.
pub fn record(entries: &mut Vec<HistoryEntry>, url: &str, title: &str, time: NaiveDateTime) {
    if let Some(existing) = entries.iter_mut().find(|e| e.url == url) {
        existing.time = time;
        existing.title = title.to_string();
    } else {
        entries.insert(
            0,
            HistoryEntry {
                time,
                url: url.to_string(),
                title: title.to_string(),
            },
        );
    }
    entries.truncate(MAX_HISTORY_ENTRIES);
}

/// Case-insensitive match on time, title or URL.
pub fn filter<'a>(entries: &'a [HistoryEntry], query: &str) -> Vec<&'a HistoryEntry> {
    let needle = query.to_lowercase();
    entries
        .iter()
        .filter(|e| {
            timestamp::format(&e.time).contains(&needle)
                || e.title.to_lowercase().contains(&needle)
                || e.url.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn filter_by_age(
    entries: &[HistoryEntry],
    age: HistoryAge,
    now: NaiveDateTime,
) -> Vec<&HistoryEntry> {
    entries.iter().filter(|e| age.matches(e.time, now)).collect()
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Write `entries` as CSV with a `Date,Title,URL` header. Every field is
/// quoted.
pub fn write_csv<'a, W: Write>(
    out: &mut W,
    entries: impl IntoIterator<Item = &'a HistoryEntry>,
) -> std::io::Result<usize> {
    writeln!(out, "Date,Title,URL")?;
    let mut count = 0;
    for entry in entries {
        writeln!(
            out,
            "{},{},{}",
            csv_field(&timestamp::format(&entry.time)),
            csv_field(&entry.title),
            csv_field(&entry.url)
        )?;
        count += 1;
    }
    Ok(count)
}

impl CollectionManager<History> {
    /// Record a visit to `url` now.
    pub fn record_visit(&self, profile: &str, url: &str, title: &str) -> Result<()> {
        self.record_visit_at(profile, url, title, timestamp::now())
    }

    /// Record a visit to `url` at `time`.
    ///
    /// An unreadable `history.json` is reported and left as it is.
    pub fn record_visit_at(
        &self,
        profile: &str,
        url: &str,
        title: &str,
        time: NaiveDateTime,
    ) -> Result<()> {
        let mut entries = self.try_load(profile)?;
        record(&mut entries, url, title, time);
        self.save(profile, &entries)
    }

    /// Export the history of `profile` to a CSV file at `dest`. Returns the
    /// number of rows written.
    pub fn export_csv(&self, profile: &str, dest: &Path) -> Result<usize> {
        let entries = self.try_load(profile)?;
        let mut buffer = Vec::new();
        let count =
            write_csv(&mut buffer, &entries).map_err(|e| StoreError::io(dest, e))?;
        atomic::write_bytes(dest, &buffer)?;
        log_info!(
            self.log,
            "HISTORY",
            "Exported {} history entries of '{}' to {}",
            count,
            profile,
            dest.display()
        );
        Ok(count)
    }
}
