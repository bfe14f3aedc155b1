use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::record::{Record, ReportedCompany};

/// Brand label used when the caller leaves it blank.
pub const UNSPECIFIED_BRAND: &str = "unspecified";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_WIDTH: usize = 10;
const SEPARATOR: char = '_';

/// Normalises a brand label: trimmed, blank becomes [`UNSPECIFIED_BRAND`].
pub fn normalize_brand(brand: &str) -> String {
    let trimmed = brand.trim();
    if trimmed.is_empty() {
        UNSPECIFIED_BRAND.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Composite snapshot identifier: one slot per calendar day and brand.
///
/// Keys sort newest date first, then brand ascending, which is the order
/// [`SnapshotStore::keys`] reports. The text form is `YYYY-MM-DD_<brand>`;
/// because the date prefix is fixed width the brand may itself contain `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    date: NaiveDate,
    brand: String,
}

impl SnapshotKey {
    pub fn new(date: NaiveDate, brand: &str) -> Self {
        Self {
            date,
            brand: normalize_brand(brand),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }
}

impl Ord for SnapshotKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .date
            .cmp(&self.date)
            .then_with(|| self.brand.cmp(&other.brand))
    }
}

impl PartialOrd for SnapshotKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}",
            self.date.format(DATE_FORMAT),
            self.brand
        )
    }
}

/// 解析快照鍵時的錯誤。 / Errors raised while parsing a snapshot key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotKeyError {
    #[error("snapshot key '{0}' must start with a YYYY-MM-DD date")]
    InvalidDate(String),
    #[error("snapshot key '{0}' must separate date and brand with '_'")]
    MissingSeparator(String),
}

impl FromStr for SnapshotKey {
    type Err = SnapshotKeyError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let date_part = text
            .get(..DATE_WIDTH)
            .ok_or_else(|| SnapshotKeyError::InvalidDate(text.to_string()))?;
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT)
            .map_err(|_| SnapshotKeyError::InvalidDate(text.to_string()))?;
        let brand = text[DATE_WIDTH..]
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| SnapshotKeyError::MissingSeparator(text.to_string()))?;
        Ok(Self::new(date, brand))
    }
}

/// A captured copy of the live lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub records: Vec<Record>,
    pub reported: Vec<ReportedCompany>,
    pub brand: String,
    pub captured_at: NaiveDateTime,
}

/// In-memory snapshot map keyed by (date, brand).
#[derive(Debug, Default, Clone)]
pub struct SnapshotStore {
    entries: BTreeMap<SnapshotKey, Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `snapshot`, returning the entry it replaced.
    pub fn save(&mut self, key: SnapshotKey, snapshot: Snapshot) -> Option<Snapshot> {
        let previous = self.entries.insert(key.clone(), snapshot);
        if previous.is_some() {
            log::info!("overwrote snapshot {key}");
        } else {
            log::info!("saved snapshot {key}");
        }
        previous
    }

    pub fn get(&self, key: &SnapshotKey) -> Option<&Snapshot> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &SnapshotKey) -> Option<Snapshot> {
        self.entries.remove(key)
    }

    /// Keys ordered by date, newest first.
    pub fn keys(&self) -> Vec<SnapshotKey> {
        self.entries.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, DATE_FORMAT).unwrap()
    }

    fn snapshot(brand: &str) -> Snapshot {
        Snapshot {
            records: Vec::new(),
            reported: Vec::new(),
            brand: brand.to_string(),
            captured_at: date("2024-01-01").and_hms_opt(9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn blank_brand_becomes_unspecified() {
        let key = SnapshotKey::new(date("2024-01-01"), "   ");
        assert_eq!(key.brand(), UNSPECIFIED_BRAND);
        assert_eq!(key.to_string(), "2024-01-01_unspecified");
    }

    #[test]
    fn brand_with_separator_round_trips() {
        let key = SnapshotKey::new(date("2024-03-05"), "Brand_X_2");
        let parsed: SnapshotKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.brand(), "Brand_X_2");
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(matches!(
            "2024-13-01_x".parse::<SnapshotKey>(),
            Err(SnapshotKeyError::InvalidDate(_))
        ));
        assert!(matches!(
            "2024-01-01x".parse::<SnapshotKey>(),
            Err(SnapshotKeyError::MissingSeparator(_))
        ));
        assert!(matches!(
            "short".parse::<SnapshotKey>(),
            Err(SnapshotKeyError::InvalidDate(_))
        ));
    }

    #[test]
    fn empty_brand_after_separator_parses_as_unspecified() {
        let parsed: SnapshotKey = "2024-01-01_".parse().unwrap();
        assert_eq!(parsed.brand(), UNSPECIFIED_BRAND);
    }

    #[test]
    fn keys_list_newest_date_first() {
        let mut store = SnapshotStore::new();
        store.save(SnapshotKey::new(date("2024-01-01"), "b"), snapshot("b"));
        store.save(SnapshotKey::new(date("2024-02-01"), "a"), snapshot("a"));
        store.save(SnapshotKey::new(date("2024-01-01"), "a"), snapshot("a"));

        let listed: Vec<String> = store.keys().iter().map(ToString::to_string).collect();
        assert_eq!(
            listed,
            vec!["2024-02-01_a", "2024-01-01_a", "2024-01-01_b"]
        );
    }

    #[test]
    fn save_overwrites_same_key() {
        let mut store = SnapshotStore::new();
        let key = SnapshotKey::new(date("2024-01-01"), "BrandX");
        assert!(store.save(key.clone(), snapshot("first")).is_none());
        let previous = store.save(key.clone(), snapshot("second")).unwrap();
        assert_eq!(previous.brand, "first");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key).unwrap().brand, "second");
    }
}
