use crate::display::{Color, PageDisplayList, Point};
use crate::fonts::{FontRole, FontSet};
use crate::page::LayoutMetrics;

/// Marker drawn before every field title.
pub const FIELD_MARKER: &str = "■";

/// One labelled field to place on the page.
#[derive(Debug, Clone, Copy)]
pub struct FieldBlock<'a> {
    pub title: &'a str,
    /// Pre-wrapped body; callers pass at least one line.
    pub lines: &'a [String],
}

/// 繪製欄位標題與內文，回傳下一個游標位置。
/// Draws a field title followed by its body lines and returns the cursor below the block.
///
/// The title uses the heading face, body lines the body face. Each line
/// advances by its font's requested size, never less than one pixel, so the
/// returned cursor is always strictly greater than `y`.
pub fn draw_field_block(
    list: &mut PageDisplayList,
    fonts: &FontSet,
    metrics: &LayoutMetrics,
    x: f32,
    y: f32,
    block: FieldBlock<'_>,
) -> f32 {
    let mut cursor = y;

    list.push_text(
        format!("{FIELD_MARKER} {}", block.title),
        FontRole::Heading,
        fonts,
        Point::new(x, cursor),
        Color::BLACK,
    );
    cursor += line_height(fonts, FontRole::Heading) + metrics.field_title_gap;

    for line in block.lines {
        list.push_text(
            line.as_str(),
            FontRole::Body,
            fonts,
            Point::new(x, cursor),
            Color::BLACK,
        );
        cursor += line_height(fonts, FontRole::Body) + metrics.body_line_gap;
    }

    cursor + metrics.block_gap
}

/// Vertical advance for one line drawn in `role`.
pub(crate) fn line_height(fonts: &FontSet, role: FontRole) -> f32 {
    fonts.get(role).size().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayCommand;
    use crate::fonts::{FontResolver, FontSizes};

    fn fonts(size: f32) -> FontSet {
        let sizes = FontSizes {
            title: size,
            heading: size,
            body: size,
            meta: size,
        };
        FontSet::resolve(&FontResolver::builtin_only(), sizes)
    }

    #[test]
    fn single_line_block_advances_by_fixed_amount() {
        let mut list = PageDisplayList::default();
        let sizes = FontSizes {
            title: 82.0,
            heading: 50.0,
            body: 38.0,
            meta: 30.0,
        };
        let fonts = FontSet::resolve(&FontResolver::builtin_only(), sizes);
        let lines = vec!["Acme".to_string()];
        let next = draw_field_block(
            &mut list,
            &fonts,
            &LayoutMetrics::default(),
            150.0,
            304.0,
            FieldBlock {
                title: "업체명",
                lines: &lines,
            },
        );
        // 50 + 20 for the title, 38 + 8 per body line, 20 trailing.
        assert_eq!(next, 304.0 + 136.0);

        let texts: Vec<_> = list.texts().collect();
        assert_eq!(texts, vec!["■ 업체명", "Acme"]);
        match &list.commands[1] {
            DisplayCommand::Text(run) => {
                assert_eq!(run.role, FontRole::Body);
                assert_eq!(run.position, Point::new(150.0, 374.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    fn block(lines: &[String]) -> FieldBlock<'_> {
        FieldBlock { title: "t", lines }
    }

    #[test]
    fn every_body_line_adds_height() {
        let metrics = LayoutMetrics::default();
        let fonts = fonts(20.0);
        let one = vec!["a".to_string()];
        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut list = PageDisplayList::default();
        let short = draw_field_block(&mut list, &fonts, &metrics, 0.0, 0.0, block(&one));
        let tall = draw_field_block(&mut list, &fonts, &metrics, 0.0, 0.0, block(&three));
        assert_eq!(tall - short, 2.0 * (20.0 + metrics.body_line_gap));
    }

    #[test]
    fn cursor_strictly_increases_even_with_zero_sizes() {
        let metrics = LayoutMetrics::default().scaled(0.0);
        let fonts = fonts(0.0);
        let lines = vec!["-".to_string()];
        let mut list = PageDisplayList::default();
        for start in [0.0, 10.0, 3000.0] {
            let next = draw_field_block(
                &mut list,
                &fonts,
                &metrics,
                0.0,
                start,
                FieldBlock {
                    title: "",
                    lines: &lines,
                },
            );
            assert!(next > start);
        }
    }
}
