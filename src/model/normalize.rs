// File: ./src/model/normalize.rs
//! Deterministic text and date cleanup applied to every extracted record.
use crate::model::event::{NormalizedEvent, RawEvent};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on description length, counted in characters.
/// The record store rejects longer rich-text values.
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Format of the due dates printed by the calendar, once ordinals are gone.
const SOURCE_DATE_FORMAT: &str = "%B %d, %Y";

static RE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\u{a0}]+").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)(st|nd|rd|th)").unwrap());

/// Collapse newlines, non-breaking spaces and whitespace runs to single
/// spaces and trim both ends.
pub fn clean_description(text: &str) -> String {
    let spaced = RE_BREAKS.replace_all(text, " ");
    RE_SPACES.replace_all(&spaced, " ").trim().to_string()
}

/// Parse "May 3rd, 2024" style text. Ordinal suffixes are stripped first.
pub fn parse_due_date(text: &str) -> Option<NaiveDate> {
    let stripped = RE_ORDINAL.replace_all(text, "$1");
    NaiveDate::parse_from_str(&stripped, SOURCE_DATE_FORMAT).ok()
}

/// `YYYY-MM-DD` when the text parses, the original text otherwise.
pub fn to_iso_date(text: &str) -> String {
    match parse_due_date(text) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => text.to_string(),
    }
}

/// Hard-truncate to at most `max` characters. Never splits a character.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// Map one raw record to its normalized form. Never fails: an unparseable
/// date degrades to the source text and is logged.
pub fn normalize(raw: &RawEvent) -> NormalizedEvent {
    let description = truncate_chars(&clean_description(&raw.description), MAX_DESCRIPTION_LEN);

    let (date, date_is_iso) = match parse_due_date(&raw.due_date_text) {
        Some(d) => (d.format("%Y-%m-%d").to_string(), true),
        None => {
            log::warn!(
                "Could not parse due date '{}' of '{}'; keeping it as text",
                raw.due_date_text,
                raw.title
            );
            (raw.due_date_text.clone(), false)
        }
    };

    NormalizedEvent {
        title: raw.title.clone(),
        description,
        date,
        course: raw.course.clone(),
        date_is_iso,
    }
}
