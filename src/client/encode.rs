// File: ./src/client/encode.rs
//! JSON shapes of the Notion API for properties, filters, pages and schemas.
use crate::store::{
    Properties, PropertyKind, PropertyValue, RecordFilter, Schema, StoreError, TargetRecord,
    TextField,
};
use serde_json::{Map, Value, json};

pub fn encode_value(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Title(s) => json!({ "title": [{ "text": { "content": s } }] }),
        PropertyValue::RichText(s) => json!({ "rich_text": [{ "text": { "content": s } }] }),
        PropertyValue::Date(s) => json!({ "date": { "start": s } }),
        PropertyValue::Select(s) => json!({ "select": { "name": s } }),
        PropertyValue::MultiSelect(names) => {
            let options: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
            json!({ "multi_select": options })
        }
    }
}

pub fn encode_properties(properties: &Properties) -> Value {
    let map: Map<String, Value> = properties
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect();
    Value::Object(map)
}

/// `None` for an empty filter (Notion then returns every page).
pub fn encode_filter(filter: &RecordFilter) -> Option<Value> {
    let mut conditions: Vec<Value> = filter
        .all
        .iter()
        .map(|c| {
            let kind = match c.field {
                TextField::Title => "title",
                TextField::RichText => "rich_text",
            };
            json!({ "property": c.property, kind: { "equals": c.value } })
        })
        .collect();

    match conditions.len() {
        0 => None,
        1 => conditions.pop(),
        _ => Some(json!({ "and": conditions })),
    }
}

fn plain_text(fragments: &Value) -> String {
    fragments
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| {
                    p.get("plain_text")
                        .or_else(|| p.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn decode_value(prop: &Value) -> Option<PropertyValue> {
    let kind = prop.get("type")?.as_str()?;
    let body = prop.get(kind)?;
    match kind {
        "title" => Some(PropertyValue::Title(plain_text(body))),
        "rich_text" => Some(PropertyValue::RichText(plain_text(body))),
        "date" => body
            .get("start")
            .and_then(Value::as_str)
            .map(|s| PropertyValue::Date(s.to_string())),
        "select" => body
            .get("name")
            .and_then(Value::as_str)
            .map(|s| PropertyValue::Select(s.to_string())),
        "multi_select" => body.as_array().map(|opts| {
            PropertyValue::MultiSelect(
                opts.iter()
                    .filter_map(|o| o.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect(),
            )
        }),
        _ => None,
    }
}

pub fn decode_page(page: &Value) -> Result<TargetRecord, StoreError> {
    let id = page
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Decode("page without id".to_string()))?;

    let properties = page
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter_map(|(name, prop)| decode_value(prop).map(|v| (name.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    Ok(TargetRecord {
        id: id.to_string(),
        properties,
    })
}

pub fn decode_schema(database: &Value) -> Result<Schema, StoreError> {
    let props = database
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Decode("database without properties".to_string()))?;

    Ok(props
        .iter()
        .filter_map(|(name, prop)| {
            prop.get("type")
                .and_then(Value::as_str)
                .map(|t| (name.clone(), PropertyKind::from_api_name(t)))
        })
        .collect())
}
