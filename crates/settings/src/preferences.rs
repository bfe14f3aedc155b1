use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PREFERENCES_VERSION: u32 = 1;

/// Page preset names understood by the renderer.
pub const KNOWN_PAGE_PRESETS: [&str; 2] = ["a4-300", "a4-150"];

pub const MAX_RECORDS_RANGE: (usize, usize) = (1, 200);
pub const WRAP_WIDTH_RANGE: (usize, usize) = (10, 200);

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 報表產生器的偏好設定。 / Report generator preferences persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPreferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub session: SessionPreferences,
    #[serde(default)]
    pub layout: LayoutPreferences,
    #[serde(default)]
    pub fonts: FontPreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for ReportPreferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            session: SessionPreferences::default(),
            layout: LayoutPreferences::default(),
            fonts: FontPreferences::default(),
        }
    }
}

impl ReportPreferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.session.sanitize();
        self.layout.sanitize();
        self.fonts.sanitize();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPreferences {
    /// Upper bound on records per session.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    20
}

impl Default for SessionPreferences {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

impl SessionPreferences {
    fn sanitize(&mut self) {
        if self.max_records == 0 {
            self.max_records = default_max_records();
        }
        self.max_records = self
            .max_records
            .clamp(MAX_RECORDS_RANGE.0, MAX_RECORDS_RANGE.1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPreferences {
    #[serde(default = "default_page")]
    pub page: String,
    #[serde(default)]
    pub card_background: bool,
    #[serde(default = "default_true")]
    pub reported_section: bool,
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
    /// Page heading; `None` keeps the built-in title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_page() -> String {
    KNOWN_PAGE_PRESETS[0].to_string()
}

fn default_true() -> bool {
    true
}

fn default_wrap_width() -> usize {
    60
}

impl Default for LayoutPreferences {
    fn default() -> Self {
        Self {
            page: default_page(),
            card_background: false,
            reported_section: true,
            wrap_width: default_wrap_width(),
            title: None,
        }
    }
}

impl LayoutPreferences {
    fn sanitize(&mut self) {
        let page = self.page.trim().to_ascii_lowercase();
        self.page = if KNOWN_PAGE_PRESETS.contains(&page.as_str()) {
            page
        } else {
            default_page()
        };
        if self.wrap_width == 0 {
            self.wrap_width = default_wrap_width();
        }
        self.wrap_width = self
            .wrap_width
            .clamp(WRAP_WIDTH_RANGE.0, WRAP_WIDTH_RANGE.1);
        if self
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            self.title = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontPreferences {
    /// Tried before the platform defaults.
    #[serde(default)]
    pub candidates: Vec<PathBuf>,
    /// Also try the bundled asset and per-OS system fonts.
    #[serde(default = "default_true")]
    pub use_system_fonts: bool,
}

impl Default for FontPreferences {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            use_system_fonts: true,
        }
    }
}

impl FontPreferences {
    fn sanitize(&mut self) {
        self.candidates
            .retain(|path| !path.as_os_str().is_empty());
        let mut seen = Vec::with_capacity(self.candidates.len());
        self.candidates.retain(|path| {
            if seen.contains(path) {
                false
            } else {
                seen.push(path.clone());
                true
            }
        });
    }
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: ReportPreferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: ReportPreferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    /// Loads `path`, or defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            log::debug!("no preferences at {}; using defaults", path.display());
            let mut data = ReportPreferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| PreferencesError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: ReportPreferences =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        log::debug!("loaded preferences from {}", path.display());
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &ReportPreferences {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut ReportPreferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
