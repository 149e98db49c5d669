//! Calendar dates for the week being planned.
//!
//! The week is anchored on its Monday; a slot's day index is its offset from
//! that anchor.

use chrono::{Datelike, Days, Local, NaiveDate};

/// Placeholder printed for an unset date in document headers.
pub const DATE_PLACEHOLDER: &str = "....";

pub fn parse_anchor(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!(input = trimmed, %err, "ignoring unparsable anchor date");
            None
        }
    }
}

/// Resolves `anchor + day_offset` to `DD/MM/YYYY`, or an empty string when no
/// anchor is set.
pub fn resolve(anchor_iso: &str, day_offset: u32) -> String {
    resolve_from(parse_anchor(anchor_iso), day_offset)
}

pub fn resolve_from(anchor: Option<NaiveDate>, day_offset: u32) -> String {
    anchor
        .and_then(|date| date.checked_add_days(Days::new(u64::from(day_offset))))
        .map(format_dmy)
        .unwrap_or_default()
}

pub fn format_dmy(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Header form of a date: `DD/MM/YYYY` or `....` when unset.
pub fn format_header_date(date: Option<NaiveDate>) -> String {
    date.map(format_dmy)
        .unwrap_or_else(|| DATE_PLACEHOLDER.to_string())
}

/// Signature-block date line, e.g. `Ngày 04 tháng 03 năm 2024`.
pub fn signature_stamp(date: NaiveDate) -> String {
    format!(
        "Ngày {:02} tháng {:02} năm {}",
        date.day(),
        date.month(),
        date.year()
    )
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
