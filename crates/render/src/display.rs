use std::fmt;

use crate::fonts::{FontHandle, FontRole, FontSet};

/// Drawing commands emitted by the composer, replayed by the rasterizer.
#[derive(Debug, Clone, Default)]
pub struct PageDisplayList {
    pub commands: Vec<DisplayCommand>,
}

impl PageDisplayList {
    /// Append a command to the display list.
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    /// Returns true if the display list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queues a text run drawn with the `role` face of `fonts`.
    pub fn push_text(
        &mut self,
        text: impl Into<String>,
        role: FontRole,
        fonts: &FontSet,
        position: Point,
        color: Color,
    ) {
        self.push(DisplayCommand::Text(TextRun {
            text: text.into(),
            role,
            font: fonts.get(role).clone(),
            position,
            color,
        }));
    }

    /// Queues a full-width rule whose top edge sits at `y`.
    pub fn push_rule(&mut self, x_start: f32, x_end: f32, y: f32, stroke: Stroke) {
        self.push(DisplayCommand::HorizontalRule {
            start: Point::new(x_start, y),
            end: Point::new(x_end, y),
            stroke,
        });
    }

    pub fn push_rect(&mut self, origin: Point, size: Size, color: Color) {
        self.push(DisplayCommand::FillRect(Rectangle {
            origin,
            size,
            color,
        }));
    }

    /// Iterates the text of every run, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DisplayCommand::Text(run) => Some(run.text.as_str()),
            _ => None,
        })
    }

    /// Text runs drawn with `role`.
    pub fn runs_with_role(&self, role: FontRole) -> impl Iterator<Item = &TextRun> + '_ {
        self.commands.iter().filter_map(move |command| match command {
            DisplayCommand::Text(run) if run.role == role => Some(run),
            _ => None,
        })
    }
}

/// Low-level drawing commands emitted by the layout stage.
#[derive(Debug, Clone)]
pub enum DisplayCommand {
    Text(TextRun),
    FillRect(Rectangle),
    HorizontalRule {
        start: Point,
        end: Point,
        stroke: Stroke,
    },
}

/// A run of text; `position` is the top-left corner of its line box.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub role: FontRole,
    pub font: FontHandle,
    pub position: Point,
    pub color: Color,
}

/// Filled axis-aligned rectangle, used for card backgrounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub origin: Point,
    pub size: Size,
    pub color: Color,
}

/// 2D size representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Opaque 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const MUTED: Color = Color::new(90, 90, 90);
    pub const SEPARATOR: Color = Color::new(220, 220, 220);
    pub const CARD: Color = Color::new(246, 247, 249);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Stroke descriptor for simple line drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    pub const fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
