//! Font resolution for the page renderer.
//! 頁面繪製用的字型解析。
//!
//! Candidates are tried in order; the first one that exists and parses
//! wins. A built-in bitmap face terminates the chain, so resolution never
//! fails.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont};
use embedded_graphics::mono_font::{ascii::FONT_10X20, MonoFont};
use once_cell::unsync::OnceCell;

/// Bitmap face used when no outline font can be loaded.
pub(crate) const BUILTIN_FACE: MonoFont<'static> = FONT_10X20;

/// A font ready to measure and draw at one pixel size.
#[derive(Clone)]
pub enum FontHandle {
    Outline {
        font: FontArc,
        size: f32,
        source: PathBuf,
    },
    Builtin {
        size: f32,
        scale: u32,
    },
}

impl FontHandle {
    /// Built-in face scaled to approximate `size`.
    pub fn builtin(size: f32) -> Self {
        let cell_height = BUILTIN_FACE.character_size.height as f32;
        let scale = (size / cell_height).round().max(1.0) as u32;
        FontHandle::Builtin {
            size: size.max(0.0),
            scale,
        }
    }

    /// Requested pixel size; layout uses it as the line height.
    pub fn size(&self) -> f32 {
        match self {
            FontHandle::Outline { size, .. } | FontHandle::Builtin { size, .. } => *size,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, FontHandle::Builtin { .. })
    }

    /// Horizontal extent of `text` in pixels.
    pub fn text_width(&self, text: &str) -> f32 {
        match self {
            FontHandle::Outline { font, size, .. } => {
                let scaled = font.as_scaled(PxScale::from(*size));
                let mut width = 0.0;
                let mut previous = None;
                for ch in text.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(prev) = previous {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    previous = Some(id);
                }
                width
            }
            FontHandle::Builtin { scale, .. } => {
                let advance = BUILTIN_FACE.character_size.width + BUILTIN_FACE.character_spacing;
                (text.chars().count() as u32 * advance * scale) as f32
            }
        }
    }

    /// Human-readable origin, used in logs.
    pub fn describe(&self) -> String {
        match self {
            FontHandle::Outline { source, size, .. } => {
                format!("{} @ {size}px", source.display())
            }
            FontHandle::Builtin { size, scale } => format!("builtin 10x20 x{scale} @ {size}px"),
        }
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FontHandle").field(&self.describe()).finish()
    }
}

/// One link in the resolution chain.
pub trait FontProvider {
    /// Cheap capability check, e.g. whether the backing file exists.
    fn is_available(&self) -> bool;

    /// Loads the face at `size`; `None` means "try the next provider".
    fn load(&self, size: f32) -> Option<FontHandle>;

    fn describe(&self) -> String;
}

/// Loads an outline font from a file path (`.ttf`, `.otf`, first face of `.ttc`).
pub struct FileFontProvider {
    path: PathBuf,
    face: OnceCell<Option<FontArc>>,
}

impl FileFontProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            face: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_face(&self) -> Option<FontArc> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) => {
                log::debug!("font {} unreadable: {err}", self.path.display());
                return None;
            }
        };
        match FontVec::try_from_vec_and_index(data, 0) {
            Ok(face) => Some(FontArc::new(face)),
            Err(err) => {
                log::debug!("font {} failed to parse: {err}", self.path.display());
                None
            }
        }
    }
}

impl FontProvider for FileFontProvider {
    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self, size: f32) -> Option<FontHandle> {
        let font = self.face.get_or_init(|| self.read_face()).clone()?;
        Some(FontHandle::Outline {
            font,
            size,
            source: self.path.clone(),
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Terminal provider: always available, always loads.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinFontProvider;

impl BuiltinFontProvider {
    pub fn font(&self, size: f32) -> FontHandle {
        FontHandle::builtin(size)
    }
}

impl FontProvider for BuiltinFontProvider {
    fn is_available(&self) -> bool {
        true
    }

    fn load(&self, size: f32) -> Option<FontHandle> {
        Some(self.font(size))
    }

    fn describe(&self) -> String {
        "builtin".to_string()
    }
}

/// Ordered provider chain ending in [`BuiltinFontProvider`].
pub struct FontResolver {
    providers: Vec<Box<dyn FontProvider>>,
    fallback: BuiltinFontProvider,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::from_paths(default_font_candidates())
    }
}

impl FontResolver {
    /// Resolver with no candidates; every lookup yields the built-in face.
    pub fn builtin_only() -> Self {
        Self {
            providers: Vec::new(),
            fallback: BuiltinFontProvider,
        }
    }

    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut resolver = Self::builtin_only();
        for path in paths {
            resolver.push(FileFontProvider::new(path));
        }
        resolver
    }

    /// Appends a provider after the existing ones.
    pub fn push<P>(&mut self, provider: P)
    where
        P: FontProvider + 'static,
    {
        self.providers.push(Box::new(provider));
    }

    pub fn candidates(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.describe()).collect()
    }

    /// Returns the first loadable candidate at `size`, or the built-in face.
    pub fn resolve(&self, size: f32) -> FontHandle {
        for provider in &self.providers {
            if !provider.is_available() {
                continue;
            }
            if let Some(handle) = provider.load(size) {
                log::debug!("resolved font {}", handle.describe());
                return handle;
            }
        }
        log::debug!("no font candidate usable at {size}px; using builtin face");
        self.fallback.font(size)
    }
}

/// Default search order: bundled asset, then per-OS Korean system fonts.
pub fn default_font_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("assets/NanumGothic.ttf"),
        PathBuf::from("assets/fonts/NanumGothic.ttf"),
    ];

    #[cfg(target_os = "windows")]
    {
        candidates.push(PathBuf::from(r"C:\Windows\Fonts\malgun.ttf"));
    }

    #[cfg(target_os = "macos")]
    {
        candidates.push(PathBuf::from(
            "/System/Library/Fonts/AppleSDGothicNeo.ttc",
        ));
    }

    #[cfg(target_os = "linux")]
    {
        candidates.push(PathBuf::from(
            "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
        ));
        candidates.push(PathBuf::from(
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
        ));
        candidates.push(PathBuf::from(
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        ));
    }

    candidates
}

/// Which face of a [`FontSet`] a text run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    Title,
    Heading,
    Body,
    Meta,
}

/// 頁面上各用途的字型。 / Fonts for each role on the page.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub title: FontHandle,
    pub heading: FontHandle,
    pub body: FontHandle,
    pub meta: FontHandle,
}

/// Pixel sizes for each [`FontSet`] role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub title: f32,
    pub heading: f32,
    pub body: f32,
    pub meta: f32,
}

impl FontSizes {
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            title: self.title * factor,
            heading: self.heading * factor,
            body: self.body * factor,
            meta: self.meta * factor,
        }
    }
}

impl FontSet {
    pub fn resolve(resolver: &FontResolver, sizes: FontSizes) -> Self {
        Self {
            title: resolver.resolve(sizes.title),
            heading: resolver.resolve(sizes.heading),
            body: resolver.resolve(sizes.body),
            meta: resolver.resolve(sizes.meta),
        }
    }

    pub fn get(&self, role: FontRole) -> &FontHandle {
        match role {
            FontRole::Title => &self.title,
            FontRole::Heading => &self.heading,
            FontRole::Body => &self.body,
            FontRole::Meta => &self.meta,
        }
    }
}
