use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::record::{Record, RecordList, ReportedCompany, DEFAULT_RECORD_CAPACITY};
use crate::snapshot::{
    normalize_brand, Snapshot, SnapshotKey, SnapshotKeyError, SnapshotStore,
};
use crate::summary::summary_text;

/// 使用者操作被拒絕時的警告。 / User-facing rejections raised by session commands.
///
/// None of these are fatal; the session is left exactly as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("at most {max} records can be entered")]
    CapacityExceeded { max: usize },
    #[error("reported company name must not be empty")]
    MissingCompanyName,
    #[error("reported company #{index} does not exist ({len} listed)")]
    ReportedIndexOutOfRange { index: usize, len: usize },
    #[error("add at least one record before rendering")]
    NothingToRender,
    #[error("no record to remove")]
    NoRecords,
    #[error("snapshot '{0}' not found")]
    SnapshotNotFound(String),
    #[error(transparent)]
    InvalidSnapshotKey(#[from] SnapshotKeyError),
}

/// What a successful `load_snapshot` restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    pub key: SnapshotKey,
    pub records: usize,
    pub reported: usize,
    pub captured_at: NaiveDateTime,
}

/// Explicit state for one user session.
///
/// Holds the live record list, the reported-company list, the brand label
/// and the snapshot store. Snapshots are deep copies, so editing the live
/// lists never touches saved data.
#[derive(Debug, Clone)]
pub struct ReportSession {
    records: RecordList,
    reported: Vec<ReportedCompany>,
    brand: String,
    snapshots: SnapshotStore,
}

impl Default for ReportSession {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECORD_CAPACITY)
    }
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RecordList::with_capacity(capacity),
            reported: Vec::new(),
            brand: String::new(),
            snapshots: SnapshotStore::new(),
        }
    }

    pub fn records(&self) -> &[Record] {
        self.records.as_slice()
    }

    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    pub fn reported(&self) -> &[ReportedCompany] {
        &self.reported
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn set_brand(&mut self, brand: impl Into<String>) {
        self.brand = brand.into();
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Appends a record and returns its 1-based position.
    pub fn add_record(&mut self, record: Record) -> Result<usize, SessionError> {
        self.records.push(record).map_err(|_| {
            let max = self.records.capacity();
            log::debug!("record rejected: list already holds {max} entries");
            SessionError::CapacityExceeded { max }
        })
    }

    pub fn pop_record(&mut self) -> Result<Record, SessionError> {
        self.records.pop().ok_or(SessionError::NoRecords)
    }

    pub fn clear_records(&mut self) {
        self.records.clear();
    }

    /// Adds a reported company; a blank name is rejected.
    pub fn add_reported(
        &mut self,
        company: impl Into<String>,
        url: Option<String>,
    ) -> Result<usize, SessionError> {
        let entry = ReportedCompany::new(company, url).ok_or_else(|| {
            log::debug!("reported company rejected: empty name");
            SessionError::MissingCompanyName
        })?;
        self.reported.push(entry);
        Ok(self.reported.len())
    }

    /// Removes the reported company at zero-based `index`.
    pub fn remove_reported(&mut self, index: usize) -> Result<ReportedCompany, SessionError> {
        if index >= self.reported.len() {
            return Err(SessionError::ReportedIndexOutOfRange {
                index: index + 1,
                len: self.reported.len(),
            });
        }
        Ok(self.reported.remove(index))
    }

    pub fn clear_reported(&mut self) {
        self.reported.clear();
    }

    /// Fails when there is nothing to put on the page.
    pub fn ensure_renderable(&self) -> Result<(), SessionError> {
        if self.records.is_empty() {
            log::debug!("render requested with no records");
            return Err(SessionError::NothingToRender);
        }
        Ok(())
    }

    /// Captures the live lists under (`date`, current brand).
    pub fn save_snapshot(&mut self, date: NaiveDate, captured_at: NaiveDateTime) -> SnapshotKey {
        let key = SnapshotKey::new(date, &self.brand);
        let snapshot = Snapshot {
            records: self.records.as_slice().to_vec(),
            reported: self.reported.clone(),
            brand: normalize_brand(&self.brand),
            captured_at,
        };
        self.snapshots.save(key.clone(), snapshot);
        key
    }

    /// Replaces the live lists and brand with the stored copy.
    ///
    /// Unsaved live edits are discarded.
    pub fn load_snapshot(&mut self, key: &SnapshotKey) -> Result<LoadedSnapshot, SessionError> {
        let snapshot = self
            .snapshots
            .get(key)
            .ok_or_else(|| SessionError::SnapshotNotFound(key.to_string()))?;
        self.records.replace(snapshot.records.clone());
        self.reported = snapshot.reported.clone();
        self.brand = snapshot.brand.clone();
        log::info!("loaded snapshot {key}");
        Ok(LoadedSnapshot {
            key: key.clone(),
            records: self.records.len(),
            reported: self.reported.len(),
            captured_at: snapshot.captured_at,
        })
    }

    /// Parses `text` as a snapshot key, then behaves like [`load_snapshot`](Self::load_snapshot).
    pub fn load_snapshot_named(&mut self, text: &str) -> Result<LoadedSnapshot, SessionError> {
        let key: SnapshotKey = text.parse()?;
        self.load_snapshot(&key)
    }

    pub fn delete_snapshot_named(&mut self, text: &str) -> Result<(), SessionError> {
        let key: SnapshotKey = text.parse()?;
        self.delete_snapshot(&key)
    }

    pub fn delete_snapshot(&mut self, key: &SnapshotKey) -> Result<(), SessionError> {
        self.snapshots
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| SessionError::SnapshotNotFound(key.to_string()))
    }

    pub fn clear_snapshots(&mut self) {
        self.snapshots.clear();
    }

    pub fn snapshot_keys(&self) -> Vec<SnapshotKey> {
        self.snapshots.keys()
    }

    pub fn summary(&self) -> String {
        summary_text(self.records.as_slice(), &self.reported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordField;

    fn day(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    fn noon(text: &str) -> NaiveDateTime {
        day(text).and_hms_opt(12, 0, 0).unwrap()
    }

    fn record(name: &str) -> Record {
        let mut record = Record::default();
        record.set(RecordField::CompanyName, name);
        record
    }

    #[test]
    fn twenty_first_record_is_rejected() {
        let mut session = ReportSession::new();
        for idx in 0..20 {
            session.add_record(record(&format!("c{idx}"))).unwrap();
        }
        let err = session.add_record(record("overflow")).unwrap_err();
        assert_eq!(err, SessionError::CapacityExceeded { max: 20 });
        assert_eq!(session.records().len(), 20);
    }

    #[test]
    fn pop_on_empty_list_warns() {
        let mut session = ReportSession::new();
        assert_eq!(session.pop_record(), Err(SessionError::NoRecords));
    }

    #[test]
    fn reported_company_lifecycle() {
        let mut session = ReportSession::new();
        assert_eq!(
            session.add_reported("", None),
            Err(SessionError::MissingCompanyName)
        );
        assert_eq!(session.add_reported("Foo", None), Ok(1));
        assert_eq!(session.add_reported("Bar", Some("http://bar".into())), Ok(2));
        assert_eq!(
            session.remove_reported(5),
            Err(SessionError::ReportedIndexOutOfRange { index: 6, len: 2 })
        );
        let removed = session.remove_reported(0).unwrap();
        assert_eq!(removed.company, "Foo");
        assert_eq!(session.reported()[0].company, "Bar");
        session.clear_reported();
        assert!(session.reported().is_empty());
    }

    #[test]
    fn render_requires_records() {
        let mut session = ReportSession::new();
        assert_eq!(
            session.ensure_renderable(),
            Err(SessionError::NothingToRender)
        );
        session.add_record(Record::default()).unwrap();
        assert!(session.ensure_renderable().is_ok());
    }

    #[test]
    fn load_restores_cleared_records() {
        let mut session = ReportSession::new();
        session.set_brand("BrandX");
        session.add_record(record("Acme")).unwrap();
        session.add_reported("Foo", None).unwrap();
        let key = session.save_snapshot(day("2024-01-01"), noon("2024-01-01"));
        assert_eq!(key.to_string(), "2024-01-01_BrandX");

        session.clear_records();
        session.clear_reported();
        session.set_brand("Other");

        let loaded = session
            .load_snapshot(&"2024-01-01_BrandX".parse().unwrap())
            .unwrap();
        assert_eq!(loaded.records, 1);
        assert_eq!(session.records(), &[record("Acme")]);
        assert_eq!(session.reported().len(), 1);
        assert_eq!(session.brand(), "BrandX");
    }

    #[test]
    fn live_edits_do_not_leak_into_snapshots() {
        let mut session = ReportSession::new();
        session.add_record(record("Acme")).unwrap();
        let key = session.save_snapshot(day("2024-01-02"), noon("2024-01-02"));
        session.add_record(record("Late")).unwrap();

        let stored = session.snapshots().get(&key).unwrap();
        assert_eq!(stored.records, vec![record("Acme")]);
        assert_eq!(stored.brand, "unspecified");
    }

    #[test]
    fn missing_snapshot_leaves_state_unchanged() {
        let mut session = ReportSession::new();
        session.add_record(record("Acme")).unwrap();
        let key = SnapshotKey::new(day("2024-01-01"), "nope");
        assert_eq!(
            session.load_snapshot(&key),
            Err(SessionError::SnapshotNotFound("2024-01-01_nope".into()))
        );
        assert_eq!(
            session.delete_snapshot(&key),
            Err(SessionError::SnapshotNotFound("2024-01-01_nope".into()))
        );
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn malformed_key_is_rejected_without_touching_state() {
        let mut session = ReportSession::new();
        session.add_record(record("Acme")).unwrap();
        session.save_snapshot(day("2024-01-01"), noon("2024-01-01"));

        assert_eq!(
            session.load_snapshot_named("2024-01-01"),
            Err(SessionError::InvalidSnapshotKey(
                SnapshotKeyError::MissingSeparator("2024-01-01".into())
            ))
        );
        assert!(matches!(
            session.delete_snapshot_named("yesterday_Brand"),
            Err(SessionError::InvalidSnapshotKey(
                SnapshotKeyError::InvalidDate(_)
            ))
        ));
        assert_eq!(session.records(), &[record("Acme")]);
        assert_eq!(session.snapshot_keys().len(), 1);

        let loaded = session
            .load_snapshot_named("2024-01-01_unspecified")
            .unwrap();
        assert_eq!(loaded.records, 1);
        session.delete_snapshot_named("2024-01-01_unspecified").unwrap();
        assert!(session.snapshot_keys().is_empty());
    }

    #[test]
    fn delete_and_clear_snapshots() {
        let mut session = ReportSession::new();
        let first = session.save_snapshot(day("2024-01-01"), noon("2024-01-01"));
        session.set_brand("B");
        session.save_snapshot(day("2024-01-03"), noon("2024-01-03"));
        assert_eq!(session.snapshot_keys().len(), 2);
        assert_eq!(session.snapshot_keys()[0].to_string(), "2024-01-03_B");

        session.delete_snapshot(&first).unwrap();
        assert_eq!(session.snapshot_keys().len(), 1);
        session.clear_snapshots();
        assert!(session.snapshot_keys().is_empty());
    }

    #[test]
    fn loading_into_smaller_capacity_truncates() {
        let mut wide = ReportSession::with_capacity(3);
        for name in ["a", "b", "c"] {
            wide.add_record(record(name)).unwrap();
        }
        let key = wide.save_snapshot(day("2024-01-01"), noon("2024-01-01"));
        let snapshot = wide.snapshots().get(&key).unwrap().clone();

        let mut narrow = ReportSession::with_capacity(2);
        narrow.snapshots.save(key.clone(), snapshot);
        let loaded = narrow.load_snapshot(&key).unwrap();
        assert_eq!(loaded.records, 2);
        assert_eq!(narrow.records().len(), 2);
    }
}
