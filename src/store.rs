// File: ./src/store.rs
//! Record-store abstraction used by the synchronizer.
//!
//! The store owns record identity; callers only ever see records through
//! `query`/`create`/`update`/`schema`.
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

pub const PROP_NAME: &str = "Name";
pub const PROP_DATE: &str = "Date";
pub const PROP_DESCRIPTION: &str = "Description";
pub const PROP_COURSE: &str = "Course";

/// Type of a store property as reported by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Date,
    Select,
    MultiSelect,
    Other(String),
}

impl PropertyKind {
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "title" => PropertyKind::Title,
            "rich_text" => PropertyKind::RichText,
            "date" => PropertyKind::Date,
            "select" => PropertyKind::Select,
            "multi_select" => PropertyKind::MultiSelect,
            other => PropertyKind::Other(other.to_string()),
        }
    }
}

/// Property name -> kind.
pub type Schema = HashMap<String, PropertyKind>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Date(String),
    Select(String),
    MultiSelect(Vec<String>),
}

impl PropertyValue {
    /// Text content, for the variants that carry a single string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Title(s)
            | PropertyValue::RichText(s)
            | PropertyValue::Date(s)
            | PropertyValue::Select(s) => Some(s),
            PropertyValue::MultiSelect(_) => None,
        }
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// The store's view of one synchronized event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub id: String,
    pub properties: Properties,
}

impl TargetRecord {
    pub fn text(&self, property: &str) -> Option<&str> {
        self.properties.get(property).and_then(|v| v.as_text())
    }
}

/// Which flavour of text comparison a condition uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    RichText,
}

/// Exact match of one text property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEquals {
    pub property: String,
    pub field: TextField,
    pub value: String,
}

/// Conjunction of exact-match conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub all: Vec<TextEquals>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title_equals(mut self, property: &str, value: &str) -> Self {
        self.all.push(TextEquals {
            property: property.to_string(),
            field: TextField::Title,
            value: value.to_string(),
        });
        self
    }

    pub fn text_equals(mut self, property: &str, value: &str) -> Self {
        self.all.push(TextEquals {
            property: property.to_string(),
            field: TextField::RichText,
            value: value.to_string(),
        });
        self
    }

    /// Evaluate the filter against a record held in memory.
    pub fn matches(&self, record: &TargetRecord) -> bool {
        self.all
            .iter()
            .all(|c| record.text(&c.property) == Some(c.value.as_str()))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unreachable: {0}")]
    Transport(String),
    #[error("record store rejected the request ({status}): {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("unexpected record store response: {0}")]
    Decode(String),
    #[error("record store rate limit still exceeded after {0} retries")]
    RateLimited(usize),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(&self, filter: &RecordFilter) -> Result<Vec<TargetRecord>, StoreError>;

    async fn create(&self, properties: &Properties) -> Result<TargetRecord, StoreError>;

    async fn update(&self, id: &str, properties: &Properties) -> Result<TargetRecord, StoreError>;

    async fn schema(&self) -> Result<Schema, StoreError>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn query(&self, filter: &RecordFilter) -> Result<Vec<TargetRecord>, StoreError> {
        (**self).query(filter).await
    }

    async fn create(&self, properties: &Properties) -> Result<TargetRecord, StoreError> {
        (**self).create(properties).await
    }

    async fn update(&self, id: &str, properties: &Properties) -> Result<TargetRecord, StoreError> {
        (**self).update(id, properties).await
    }

    async fn schema(&self) -> Result<Schema, StoreError> {
        (**self).schema().await
    }
}
