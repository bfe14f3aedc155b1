//! Record lists, snapshot store and session state for report sheets.
//! 報表資料模型、快照儲存與工作階段狀態。

pub mod record;
pub mod session;
pub mod snapshot;
pub mod summary;

pub use record::{
    Record, RecordField, RecordList, ReportedCompany, DEFAULT_RECORD_CAPACITY, PLACEHOLDER,
};
pub use session::{LoadedSnapshot, ReportSession, SessionError};
pub use snapshot::{
    normalize_brand, Snapshot, SnapshotKey, SnapshotKeyError, SnapshotStore, UNSPECIFIED_BRAND,
};
pub use summary::{record_label, summary_text, REPORTED_HEADER, SUMMARY_HEADER};
