// File: ./src/extract/payload.rs
//! Reads the `data-events` JSON blob out of rendered calendar markup.
use crate::extract::ExtractError;
use crate::model::RawEvent;
use crate::model::event::{NO_COURSE, NO_DATE, NO_DESCRIPTION, NO_TITLE};
use scraper::{Html, Selector};
use serde_json::{Map, Value};

pub const EVENTS_ATTRIBUTE: &str = "data-events";

/// Locate `#<container_id>` in `page_source` and decode its event array.
///
/// Every array entry becomes one `RawEvent`; duplicates are kept.
pub fn parse_events(page_source: &str, container_id: &str) -> Result<Vec<RawEvent>, ExtractError> {
    let document = Html::parse_document(page_source);
    let css = format!("#{}", container_id);
    let selector = Selector::parse(&css).map_err(|e| {
        ExtractError::PayloadParse(format!("invalid container id '{}': {:?}", container_id, e))
    })?;

    let container = document.select(&selector).next().ok_or_else(|| {
        ExtractError::PayloadParse(format!("element #{} not found in page", container_id))
    })?;

    let raw = container.value().attr(EVENTS_ATTRIBUTE).ok_or_else(|| {
        ExtractError::PayloadParse(format!(
            "#{} has no {} attribute",
            container_id, EVENTS_ATTRIBUTE
        ))
    })?;

    let entries: Vec<Value> = serde_json::from_str(raw)
        .map_err(|e| ExtractError::PayloadParse(format!("{} is not a JSON array: {}", EVENTS_ATTRIBUTE, e)))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let obj = entry.as_object().ok_or_else(|| {
                ExtractError::PayloadParse(format!("event #{} is not an object", i))
            })?;
            Ok(RawEvent {
                title: text_field(obj, "title", NO_TITLE),
                description: text_field(obj, "Description", NO_DESCRIPTION),
                due_date_text: text_field(obj, "DueDate", NO_DATE),
                course: text_field(obj, "Course", NO_COURSE),
            })
        })
        .collect()
}

fn text_field(obj: &Map<String, Value>, key: &str, sentinel: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => sentinel.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(attr: &str) -> String {
        format!(
            r#"<html><body><div id="generalCalendar" data-events="{}"></div></body></html>"#,
            attr
        )
    }

    #[test]
    fn decodes_entity_escaped_attribute() {
        let html = page(
            "[{&quot;title&quot;:&quot;Essay&quot;,&quot;Description&quot;:&quot;Write it&quot;,&quot;DueDate&quot;:&quot;May 3rd, 2024&quot;,&quot;Course&quot;:&quot;English&quot;}]",
        );
        let events = parse_events(&html, "generalCalendar").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Essay");
        assert_eq!(events[0].description, "Write it");
        assert_eq!(events[0].due_date_text, "May 3rd, 2024");
        assert_eq!(events[0].course, "English");
    }

    #[test]
    fn missing_fields_get_sentinels() {
        let html = page("[{&quot;DueDate&quot;:null}]");
        let events = parse_events(&html, "generalCalendar").unwrap();
        assert_eq!(events[0].title, NO_TITLE);
        assert_eq!(events[0].description, NO_DESCRIPTION);
        assert_eq!(events[0].due_date_text, NO_DATE);
        assert_eq!(events[0].course, NO_COURSE);
    }

    #[test]
    fn duplicate_entries_are_kept() {
        let entry = "{&quot;title&quot;:&quot;Quiz&quot;}";
        let html = page(&format!("[{},{}]", entry, entry));
        assert_eq!(parse_events(&html, "generalCalendar").unwrap().len(), 2);
    }

    #[test]
    fn structural_problems_are_payload_errors() {
        let no_container = "<html><body><div id=\"other\"></div></body></html>";
        assert!(matches!(
            parse_events(no_container, "generalCalendar"),
            Err(ExtractError::PayloadParse(_))
        ));

        let no_attr = "<html><body><div id=\"generalCalendar\"></div></body></html>";
        assert!(matches!(
            parse_events(no_attr, "generalCalendar"),
            Err(ExtractError::PayloadParse(_))
        ));

        assert!(matches!(
            parse_events(&page("not json"), "generalCalendar"),
            Err(ExtractError::PayloadParse(_))
        ));
        assert!(matches!(
            parse_events(&page("[1, 2]"), "generalCalendar"),
            Err(ExtractError::PayloadParse(_))
        ));
    }
}
