//! Persistent preferences for the report generator.
//! 報表產生器的偏好設定儲存。

pub mod preferences;

pub use preferences::{
    FontPreferences, LayoutPreferences, PreferencesError, PreferencesStore, ReportPreferences,
    SessionPreferences, KNOWN_PAGE_PRESETS,
};
