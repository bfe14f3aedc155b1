use std::fmt;
use std::str::FromStr;

use crate::fonts::FontSizes;

/// Pixel canvas plus print resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    pub width_px: u32,
    pub height_px: u32,
    pub margin_px: f32,
    pub dpi: f32,
}

impl PageSpec {
    pub const fn new(width_px: u32, height_px: u32, margin_px: f32, dpi: f32) -> Self {
        Self {
            width_px,
            height_px,
            margin_px,
            dpi,
        }
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        (self.width_px as f32 - 2.0 * self.margin_px).max(0.0)
    }

    /// Page size in PDF points (1/72").
    pub fn size_in_points(&self) -> (f32, f32) {
        let dpi = if self.dpi > 0.0 { self.dpi } else { 72.0 };
        (
            self.width_px as f32 * 72.0 / dpi,
            self.height_px as f32 * 72.0 / dpi,
        )
    }
}

/// Supported page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PagePreset {
    /// A4 at 300 dpi, 2480×3508 px.
    #[default]
    A4Print,
    /// A4 at 150 dpi, 1240×1754 px; everything drawn at half size.
    A4Compact,
}

impl PagePreset {
    pub const ALL: [PagePreset; 2] = [PagePreset::A4Print, PagePreset::A4Compact];

    pub fn page(self) -> PageSpec {
        match self {
            PagePreset::A4Print => PageSpec::new(2480, 3508, 120.0, 300.0),
            PagePreset::A4Compact => PageSpec::new(1240, 1754, 60.0, 150.0),
        }
    }

    /// Factor applied to the 300 dpi font sizes and spacing.
    pub fn scale(self) -> f32 {
        match self {
            PagePreset::A4Print => 1.0,
            PagePreset::A4Compact => 0.5,
        }
    }

    pub fn font_sizes(self) -> FontSizes {
        PRINT_FONT_SIZES.scaled(self.scale())
    }

    pub fn metrics(self) -> LayoutMetrics {
        LayoutMetrics::default().scaled(self.scale())
    }

    pub const fn name(self) -> &'static str {
        match self {
            PagePreset::A4Print => "a4-300",
            PagePreset::A4Compact => "a4-150",
        }
    }
}

impl fmt::Display for PagePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PagePreset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        PagePreset::ALL
            .into_iter()
            .find(|preset| preset.name() == normalized)
            .ok_or_else(|| format!("unknown page preset '{value}' (expected a4-300 or a4-150)"))
    }
}

const PRINT_FONT_SIZES: FontSizes = FontSizes {
    title: 82.0,
    heading: 50.0,
    body: 38.0,
    meta: 30.0,
};

/// 版面間距（像素）。 / Fixed layout gaps in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub title_gap: f32,
    pub meta_gap: f32,
    pub divider_thickness: f32,
    pub divider_gap: f32,
    pub label_gap: f32,
    pub field_title_gap: f32,
    pub body_line_gap: f32,
    pub block_gap: f32,
    pub separator_lead: f32,
    pub separator_thickness: f32,
    pub separator_gap: f32,
    /// Extra room kept free above the bottom margin before a card may start.
    pub safety_reserve: f32,
    /// Height of the optional card background box.
    pub card_height: f32,
    /// Horizontal indent of card contents from the left margin.
    pub card_inset: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            title_gap: 18.0,
            meta_gap: 24.0,
            divider_thickness: 4.0,
            divider_gap: 26.0,
            label_gap: 8.0,
            field_title_gap: 20.0,
            body_line_gap: 8.0,
            block_gap: 20.0,
            separator_lead: 10.0,
            separator_thickness: 3.0,
            separator_gap: 21.0,
            safety_reserve: 100.0,
            card_height: 874.0,
            card_inset: 30.0,
        }
    }
}

impl LayoutMetrics {
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            title_gap: self.title_gap * factor,
            meta_gap: self.meta_gap * factor,
            divider_thickness: self.divider_thickness * factor,
            divider_gap: self.divider_gap * factor,
            label_gap: self.label_gap * factor,
            field_title_gap: self.field_title_gap * factor,
            body_line_gap: self.body_line_gap * factor,
            block_gap: self.block_gap * factor,
            separator_lead: self.separator_lead * factor,
            separator_thickness: self.separator_thickness * factor,
            separator_gap: self.separator_gap * factor,
            safety_reserve: self.safety_reserve * factor,
            card_height: self.card_height * factor,
            card_inset: self.card_inset * factor,
        }
    }
}
