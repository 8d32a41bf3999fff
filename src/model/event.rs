// File: ./src/model/event.rs
//! Calendar records as they move through the pipeline.
use serde::{Deserialize, Serialize};

pub const NO_TITLE: &str = "No Title";
pub const NO_DESCRIPTION: &str = "No Description";
pub const NO_DATE: &str = "No Date";
pub const NO_COURSE: &str = "No Course";

/// One calendar entry exactly as the page embedded it.
///
/// Missing fields carry an explicit "No <Field>" sentinel rather than an
/// empty string so that they survive normalization and show up in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub title: String,
    pub description: String,
    pub due_date_text: String,
    pub course: String,
}

impl RawEvent {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_date_text: due_date_text.into(),
            course: NO_COURSE.to_string(),
        }
    }

    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course = course.into();
        self
    }
}

/// A record ready to be synchronized.
///
/// `date` is `YYYY-MM-DD` when the source text parsed, otherwise the
/// source text verbatim (`date_is_iso` tells the two apart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub title: String,
    pub description: String,
    pub date: String,
    pub course: String,
    #[serde(skip)]
    pub date_is_iso: bool,
}
