use chrono::NaiveDateTime;
use reportsheet_core::{Record, ReportSession, ReportedCompany, REPORTED_HEADER};

use crate::block::{draw_field_block, line_height, FieldBlock};
use crate::display::{Color, PageDisplayList, Point, Size, Stroke};
use crate::fonts::{FontResolver, FontRole, FontSet, FontSizes};
use crate::page::{LayoutMetrics, PagePreset, PageSpec};
use crate::wrap::{wrap_field, DEFAULT_WRAP_WIDTH};

/// Heading printed at the top of every page.
pub const DEFAULT_TITLE: &str = "신고 및 단속완료";

/// Options used by the composer when laying out the page.
/// 版面配置時採用的選項。
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    pub page: PageSpec,
    pub metrics: LayoutMetrics,
    pub font_sizes: FontSizes,
    pub wrap_width: usize,
    pub title: String,
    /// Draw a tinted box behind each card.
    pub card_background: bool,
    /// Append the reported-company list after the cards.
    pub reported_section: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self::for_preset(PagePreset::default())
    }
}

impl ComposeOptions {
    pub fn for_preset(preset: PagePreset) -> Self {
        Self {
            page: preset.page(),
            metrics: preset.metrics(),
            font_sizes: preset.font_sizes(),
            wrap_width: DEFAULT_WRAP_WIDTH,
            title: DEFAULT_TITLE.to_string(),
            card_background: false,
            reported_section: true,
        }
    }

    /// Cursor position past which no further card is started.
    pub fn print_limit(&self) -> f32 {
        self.page.height_px as f32 - self.page.margin_px - self.metrics.safety_reserve
    }
}

/// Everything placed on one page.
#[derive(Debug, Clone, Copy)]
pub struct ReportContent<'a> {
    pub records: &'a [Record],
    pub reported: &'a [ReportedCompany],
    pub generated_at: NaiveDateTime,
}

impl<'a> ReportContent<'a> {
    pub fn from_session(session: &'a ReportSession, generated_at: NaiveDateTime) -> Self {
        Self {
            records: session.records(),
            reported: session.reported(),
            generated_at,
        }
    }
}

/// 版面配置完成後的摘要。 / How much of the input made it onto the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeSummary {
    pub records_supplied: usize,
    pub records_rendered: usize,
    pub reported_rendered: usize,
    pub final_cursor: f32,
}

impl ComposeSummary {
    /// True when the page ran out of room before the last record.
    pub fn is_truncated(&self) -> bool {
        self.records_rendered < self.records_supplied
    }

    pub fn records_omitted(&self) -> usize {
        self.records_supplied - self.records_rendered
    }
}

/// A laid-out page ready to rasterize.
#[derive(Debug, Clone)]
pub struct ComposedPage {
    pub page: PageSpec,
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub display_list: PageDisplayList,
    pub summary: ComposeSummary,
}

/// Contract implemented by the page layout engine.
/// 版面引擎需實作的介面契約。
pub trait PageComposer {
    fn compose(
        &self,
        content: &ReportContent<'_>,
        fonts: &FontSet,
        options: &ComposeOptions,
    ) -> ComposedPage;
}

/// Single-page composer: header, one card per record, optional reported list.
///
/// Cards are laid out top to bottom. After each card the cursor is compared
/// with [`ComposeOptions::print_limit`]; once past it the remaining records
/// are left off the page. The reported-company section is appended without
/// any such check.
#[derive(Debug, Default, Clone, Copy)]
pub struct CardComposer;

impl PageComposer for CardComposer {
    fn compose(
        &self,
        content: &ReportContent<'_>,
        fonts: &FontSet,
        options: &ComposeOptions,
    ) -> ComposedPage {
        let page = options.page;
        let metrics = &options.metrics;
        let left = page.margin_px;
        let right = page.width_px as f32 - page.margin_px;
        let card_x = left + metrics.card_inset;
        let limit = options.print_limit();

        let mut list = PageDisplayList::default();
        let mut cursor = page.margin_px;

        let title_width = fonts.title.text_width(&options.title);
        let title_x = ((page.width_px as f32 - title_width) / 2.0).max(left);
        list.push_text(
            options.title.as_str(),
            FontRole::Title,
            fonts,
            Point::new(title_x, cursor),
            Color::BLACK,
        );
        cursor += line_height(fonts, FontRole::Title) + metrics.title_gap;

        let meta = format!(
            "생성일시: {}   총 입력: {}건",
            content.generated_at.format("%Y-%m-%d %H:%M"),
            content.records.len()
        );
        list.push_text(
            meta,
            FontRole::Meta,
            fonts,
            Point::new(left, cursor),
            Color::MUTED,
        );
        cursor += line_height(fonts, FontRole::Meta) + metrics.meta_gap;

        list.push_rule(
            left,
            right,
            cursor,
            Stroke::new(metrics.divider_thickness, Color::BLACK),
        );
        cursor += metrics.divider_thickness + metrics.divider_gap;

        let mut records_rendered = 0;
        for (idx, record) in content.records.iter().enumerate() {
            if options.card_background {
                list.push_rect(
                    Point::new(left, cursor),
                    Size {
                        width: page.content_width(),
                        height: metrics.card_height,
                    },
                    Color::CARD,
                );
            }

            list.push_text(
                format!("#{}", idx + 1),
                FontRole::Heading,
                fonts,
                Point::new(card_x, cursor),
                Color::BLACK,
            );
            cursor += line_height(fonts, FontRole::Heading) + metrics.label_gap;

            for (field, value) in record.fields() {
                let lines = wrap_field(value, options.wrap_width);
                cursor = draw_field_block(
                    &mut list,
                    fonts,
                    metrics,
                    card_x,
                    cursor,
                    FieldBlock {
                        title: field.label(),
                        lines: &lines,
                    },
                );
            }

            cursor += metrics.separator_lead;
            list.push_rule(
                left,
                right,
                cursor,
                Stroke::new(metrics.separator_thickness, Color::SEPARATOR),
            );
            cursor += metrics.separator_thickness + metrics.separator_gap;
            records_rendered += 1;

            if cursor > limit {
                break;
            }
        }

        let mut reported_rendered = 0;
        if options.reported_section && !content.reported.is_empty() {
            list.push_text(
                REPORTED_HEADER,
                FontRole::Heading,
                fonts,
                Point::new(left, cursor),
                Color::BLACK,
            );
            cursor += line_height(fonts, FontRole::Heading) + metrics.label_gap;

            for (idx, entry) in content.reported.iter().enumerate() {
                list.push_text(
                    format!("{}. {}", idx + 1, entry.company),
                    FontRole::Body,
                    fonts,
                    Point::new(card_x, cursor),
                    Color::BLACK,
                );
                cursor += line_height(fonts, FontRole::Body) + metrics.body_line_gap;
                if let Some(url) = entry.url() {
                    list.push_text(
                        format!("URL: {url}"),
                        FontRole::Meta,
                        fonts,
                        Point::new(card_x + metrics.card_inset, cursor),
                        Color::MUTED,
                    );
                    cursor += line_height(fonts, FontRole::Meta) + metrics.body_line_gap;
                }
                reported_rendered += 1;
            }
        }

        let summary = ComposeSummary {
            records_supplied: content.records.len(),
            records_rendered,
            reported_rendered,
            final_cursor: cursor,
        };
        if summary.is_truncated() {
            log::info!(
                "page full: {} of {} records rendered",
                summary.records_rendered,
                summary.records_supplied
            );
        }
        log::info!(
            "composed {}x{} page with {} cards",
            page.width_px,
            page.height_px,
            summary.records_rendered
        );

        ComposedPage {
            page,
            title: options.title.clone(),
            generated_at: content.generated_at,
            display_list: list,
            summary,
        }
    }
}

/// Resolves fonts for `options` and lays out `content` with [`CardComposer`].
pub fn compose_report(
    content: &ReportContent<'_>,
    options: &ComposeOptions,
    resolver: &FontResolver,
) -> ComposedPage {
    let fonts = FontSet::resolve(resolver, options.font_sizes);
    CardComposer.compose(content, &fonts, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayCommand;
    use chrono::NaiveDate;
    use reportsheet_core::RecordField;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|day| day.and_hms_opt(9, 5, 0))
            .unwrap()
    }

    fn records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|idx| {
                let mut record = Record::default();
                record.set(RecordField::CompanyName, format!("Company {idx}"));
                record
            })
            .collect()
    }

    fn compose(
        records: &[Record],
        reported: &[ReportedCompany],
        options: &ComposeOptions,
    ) -> ComposedPage {
        let content = ReportContent {
            records,
            reported,
            generated_at: generated_at(),
        };
        compose_report(&content, options, &FontResolver::builtin_only())
    }

    #[test]
    fn header_precedes_cards() {
        let page = compose(&records(1), &[], &ComposeOptions::default());
        let texts: Vec<_> = page.display_list.texts().collect();
        assert_eq!(texts[0], DEFAULT_TITLE);
        assert_eq!(texts[1], "생성일시: 2024-05-17 09:05   총 입력: 1건");
        assert_eq!(texts[2], "#1");
        assert_eq!(texts[3], "■ 이용중인 업체 확인된곳");
        assert_eq!(texts[4], "-");
        assert!(texts.contains(&"Company 0"));
    }

    #[test]
    fn one_card_cursor_matches_fixed_spacing() {
        let page = compose(&records(1), &[], &ComposeOptions::default());
        // 120 margin, title 100, meta 54, divider 30, card 908.
        assert_eq!(page.summary.final_cursor, 120.0 + 100.0 + 54.0 + 30.0 + 908.0);
        assert_eq!(page.summary.records_rendered, 1);
        assert!(!page.summary.is_truncated());
    }

    #[test]
    fn overflow_stops_after_page_fills() {
        for count in 1..=4 {
            let page = compose(&records(count), &[], &ComposeOptions::default());
            assert_eq!(page.summary.records_rendered, count);
        }
        for count in [5, 12, 20] {
            let page = compose(&records(count), &[], &ComposeOptions::default());
            assert_eq!(page.summary.records_rendered, 4);
            assert_eq!(page.summary.records_omitted(), count - 4);
            assert!(page.summary.is_truncated());
        }
    }

    #[test]
    fn long_fields_wrap_and_take_more_room() {
        let mut record = Record::default();
        record.set(
            RecordField::StoreUrl,
            "https://shop.example.com/a word list that is quite a bit longer than sixty characters in total",
        );
        let wrapped = compose(&[record], &[], &ComposeOptions::default());
        let plain = compose(&records(1), &[], &ComposeOptions::default());
        assert_eq!(
            wrapped.summary.final_cursor - plain.summary.final_cursor,
            38.0 + 8.0
        );
    }

    #[test]
    fn reported_section_is_appended_without_overflow_check() {
        let reported = vec![
            ReportedCompany::new("Foo", None).unwrap(),
            ReportedCompany::new("Bar", Some("http://bar".into())).unwrap(),
        ];
        let page = compose(&records(20), &reported, &ComposeOptions::default());
        assert_eq!(page.summary.records_rendered, 4);
        assert_eq!(page.summary.reported_rendered, 2);
        let texts: Vec<_> = page.display_list.texts().collect();
        assert!(texts.contains(&REPORTED_HEADER));
        assert!(texts.contains(&"2. Bar"));
        assert!(texts.contains(&"URL: http://bar"));

        let options = ComposeOptions {
            reported_section: false,
            ..ComposeOptions::default()
        };
        let page = compose(&records(1), &reported, &options);
        assert_eq!(page.summary.reported_rendered, 0);
    }

    #[test]
    fn card_background_is_optional() {
        let count_rects = |page: &ComposedPage| {
            page.display_list
                .commands
                .iter()
                .filter(|command| matches!(command, DisplayCommand::FillRect(_)))
                .count()
        };
        let plain = compose(&records(3), &[], &ComposeOptions::default());
        assert_eq!(count_rects(&plain), 0);

        let options = ComposeOptions {
            card_background: true,
            ..ComposeOptions::default()
        };
        let boxed = compose(&records(3), &[], &options);
        assert_eq!(count_rects(&boxed), 3);
        assert_eq!(boxed.summary.final_cursor, plain.summary.final_cursor);
    }

    #[test]
    fn compact_preset_fits_same_number_of_cards() {
        let options = ComposeOptions::for_preset(PagePreset::A4Compact);
        assert_eq!(options.print_limit(), 1644.0);
        let page = compose(&records(10), &[], &options);
        assert_eq!(page.summary.records_rendered, 4);
        assert_eq!(page.page.width_px, 1240);
    }
}
