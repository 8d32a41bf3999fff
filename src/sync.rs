// File: ./src/sync.rs
//! Idempotent create-if-absent of normalized events into a record store.
//!
//! The dedup key is the exact `(title, description)` pair: two records with
//! the same title but different descriptions are distinct events.
use crate::model::normalize::truncate_chars;
use crate::model::{MAX_DESCRIPTION_LEN, NormalizedEvent};
use crate::store::{
    PROP_COURSE, PROP_DATE, PROP_DESCRIPTION, PROP_NAME, Properties, PropertyKind, PropertyValue,
    RecordFilter, RecordStore, StoreError,
};

/// What happened to the optional `Course` property after a create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoursePatch {
    Applied,
    /// The store has no usable `Course` property; nothing was sent.
    PropertyAbsent,
    /// The follow-up patch failed. The created record is kept.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { id: String, course: CoursePatch },
    Skipped { matches: usize },
}

impl UpsertOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created { .. })
    }
}

pub struct Synchronizer<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> Synchronizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look the event up by `(title, description)` and create it if absent.
    ///
    /// Store failures during the lookup or the create are returned to the
    /// caller; nothing has been written in that case. A failed `Course`
    /// patch is reported in the outcome instead.
    pub async fn upsert(&self, event: &NormalizedEvent) -> Result<UpsertOutcome, StoreError> {
        let description = truncate_chars(&event.description, MAX_DESCRIPTION_LEN);

        let filter = RecordFilter::new()
            .title_equals(PROP_NAME, &event.title)
            .text_equals(PROP_DESCRIPTION, &description);
        let existing = self.store.query(&filter).await?;
        if !existing.is_empty() {
            log::info!("'{}' already exists, skipping", event.title);
            return Ok(UpsertOutcome::Skipped {
                matches: existing.len(),
            });
        }

        let mut properties = Properties::new();
        properties.insert(PROP_NAME.to_string(), PropertyValue::Title(event.title.clone()));
        properties.insert(PROP_DATE.to_string(), PropertyValue::Date(event.date.clone()));
        properties.insert(PROP_DESCRIPTION.to_string(), PropertyValue::RichText(description));

        let record = self.store.create(&properties).await?;
        log::info!("Created '{}' ({})", event.title, record.id);

        let course = self.patch_course(&record.id, &event.course).await;
        Ok(UpsertOutcome::Created {
            id: record.id,
            course,
        })
    }

    async fn patch_course(&self, id: &str, course: &str) -> CoursePatch {
        let schema = match self.store.schema().await {
            Ok(schema) => schema,
            Err(e) => {
                log::warn!("Could not read store schema for {}: {}", id, e);
                return CoursePatch::Failed(e.to_string());
            }
        };

        let value = match schema.get(PROP_COURSE) {
            Some(PropertyKind::Select) => PropertyValue::Select(course.to_string()),
            Some(PropertyKind::MultiSelect) => PropertyValue::MultiSelect(vec![course.to_string()]),
            Some(PropertyKind::RichText) => PropertyValue::RichText(course.to_string()),
            Some(PropertyKind::Title) => PropertyValue::Title(course.to_string()),
            Some(other) => {
                log::debug!("{} property has unsupported kind {:?}", PROP_COURSE, other);
                return CoursePatch::PropertyAbsent;
            }
            None => return CoursePatch::PropertyAbsent,
        };

        let mut properties = Properties::new();
        properties.insert(PROP_COURSE.to_string(), value);
        match self.store.update(id, &properties).await {
            Ok(_) => CoursePatch::Applied,
            Err(e) => {
                log::warn!("Could not set {} on {}: {}", PROP_COURSE, id, e);
                CoursePatch::Failed(e.to_string())
            }
        }
    }
}
