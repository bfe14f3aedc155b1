//! Plain-text message that accompanies the rendered page in a chat.
//! 隨圖片一併傳送的純文字摘要。

use crate::record::{Record, RecordField, ReportedCompany, PLACEHOLDER};

pub const SUMMARY_HEADER: &str = "[신고 및 단속완료 요약]";
pub const REPORTED_HEADER: &str = "[신고 완료 업체]";

/// Builds the summary message for the given lists.
pub fn summary_text(records: &[Record], reported: &[ReportedCompany]) -> String {
    let mut lines = vec![SUMMARY_HEADER.to_string()];

    for (index, record) in records.iter().enumerate() {
        let mut heading = format!(
            "#{} [{}]",
            index + 1,
            record.display(RecordField::CompanyName)
        );
        if let Some(source) = record.get(RecordField::ConfirmedSource) {
            heading.push(' ');
            heading.push_str(source);
        }
        lines.push(heading);
        lines.push(format!(
            " - 이용업체: {}",
            record.display(RecordField::UsingCompany)
        ));
        lines.push(format!(" - URL: {}", record.display(RecordField::StoreUrl)));
        lines.push(format!(
            " - 주문자명: {}, 연락처: {}",
            record.display(RecordField::OrderName),
            record.display(RecordField::Phone)
        ));
    }

    if !reported.is_empty() {
        lines.push(REPORTED_HEADER.to_string());
        for (index, entry) in reported.iter().enumerate() {
            lines.push(format!("{}. {}", index + 1, entry.company));
            if let Some(url) = entry.url() {
                lines.push(format!("   - URL: {url}"));
            }
        }
    }

    lines.join("\n")
}

/// Shorthand used when a list entry needs a one-line label.
pub fn record_label(record: &Record) -> &str {
    record
        .get(RecordField::CompanyName)
        .or_else(|| record.get(RecordField::UsingCompany))
        .unwrap_or(PLACEHOLDER)
}
