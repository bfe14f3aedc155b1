//! Page rendering for report sheets: wrap, lay out, rasterize, encode.
//! 報表頁面繪製：斷行、版面配置、點陣化與輸出編碼。

pub mod block;
pub mod display;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod page;
pub mod raster;
pub mod wrap;

pub use block::{draw_field_block, FieldBlock, FIELD_MARKER};
pub use display::{Color, DisplayCommand, PageDisplayList, TextRun};
pub use export::{
    artifact_file_name, encode_pdf, encode_png, export_page, export_raster, ExportArtifact,
    ExportError, ExportFormat,
};
pub use fonts::{
    default_font_candidates, BuiltinFontProvider, FileFontProvider, FontHandle, FontProvider,
    FontResolver, FontRole, FontSet, FontSizes,
};
pub use layout::{
    compose_report, CardComposer, ComposeOptions, ComposeSummary, ComposedPage, PageComposer,
    ReportContent, DEFAULT_TITLE,
};
pub use page::{LayoutMetrics, PagePreset, PageSpec};
pub use raster::{preview, rasterize, rasterize_display_list, DEFAULT_PREVIEW_FACTOR};
pub use wrap::{wrap_field, wrap_text, DEFAULT_WRAP_WIDTH};
