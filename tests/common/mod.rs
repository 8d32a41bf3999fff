// Shared fakes for the integration tests: an in-memory record store and a
// scripted browser.
#![allow(dead_code)]

use async_trait::async_trait;
use skysync::extract::{
    BrowserError, BrowserLauncher, BrowserSession, ExtractorSettings, Locator, WaitResult,
};
use skysync::model::NormalizedEvent;
use skysync::store::{
    Properties, PropertyKind, RecordFilter, RecordStore, Schema, StoreError, TargetRecord,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- Record store ---

#[derive(Default)]
pub struct FakeStore {
    pub records: Mutex<Vec<TargetRecord>>,
    pub schema: Mutex<Schema>,
    pub calls: Mutex<Vec<String>>,
    pub fail_create_for: Mutex<HashSet<String>>,
    pub fail_query: AtomicBool,
    pub fail_update: AtomicBool,
    next_id: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        let store = Self::default();
        {
            let mut schema = store.schema.lock().unwrap();
            schema.insert("Name".to_string(), PropertyKind::Title);
            schema.insert("Date".to_string(), PropertyKind::Date);
            schema.insert("Description".to_string(), PropertyKind::RichText);
        }
        store
    }

    pub fn with_course(kind: PropertyKind) -> Self {
        let store = Self::new();
        store
            .schema
            .lock()
            .unwrap()
            .insert("Course".to_string(), kind);
        store
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn calls_named(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == name)
            .count()
    }

    pub fn record(&self, id: &str) -> Option<TargetRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    fn log(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

fn rejected(message: &str) -> StoreError {
    StoreError::Api {
        status: 400,
        code: "validation_error".to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn query(&self, filter: &RecordFilter) -> Result<Vec<TargetRecord>, StoreError> {
        self.log("query");
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection reset".to_string()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn create(&self, properties: &Properties) -> Result<TargetRecord, StoreError> {
        self.log("create");
        let title = properties
            .get("Name")
            .and_then(|v| v.as_text())
            .unwrap_or_default()
            .to_string();
        if self.fail_create_for.lock().unwrap().contains(&title) {
            return Err(rejected("body failed validation"));
        }
        let id = format!("page-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = TargetRecord {
            id,
            properties: properties.clone(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, properties: &Properties) -> Result<TargetRecord, StoreError> {
        self.log("update");
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(rejected("Course is not a property that exists"));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| rejected("object_not_found"))?;
        for (k, v) in properties {
            record.properties.insert(k.clone(), v.clone());
        }
        Ok(record.clone())
    }

    async fn schema(&self) -> Result<Schema, StoreError> {
        self.log("schema");
        Ok(self.schema.lock().unwrap().clone())
    }
}

pub fn event(title: &str, description: &str) -> NormalizedEvent {
    NormalizedEvent {
        title: title.to_string(),
        description: description.to_string(),
        date: "2024-05-03".to_string(),
        course: "English".to_string(),
        date_is_iso: true,
    }
}

// --- Browser ---

#[derive(Debug, Default)]
pub struct BrowserLog {
    pub launches: usize,
    pub closes: usize,
    pub navigations: Vec<String>,
    pub waits: Vec<Locator>,
    pub keys: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub struct BrowserScript {
    /// 0-based index of the wait that times out.
    pub timeout_on_wait: Option<usize>,
    pub page_source: String,
    pub fail_launch: bool,
    pub fail_navigate: bool,
}

#[derive(Clone)]
pub struct ScriptedLauncher {
    pub script: BrowserScript,
    pub log: Arc<Mutex<BrowserLog>>,
}

impl ScriptedLauncher {
    pub fn new(script: BrowserScript) -> Self {
        Self {
            script,
            log: Arc::new(Mutex::new(BrowserLog::default())),
        }
    }

    pub fn with_page(page_source: impl Into<String>) -> Self {
        Self::new(BrowserScript {
            page_source: page_source.into(),
            ..Default::default()
        })
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

pub struct ScriptedSession {
    script: BrowserScript,
    log: Arc<Mutex<BrowserLog>>,
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    type Session = ScriptedSession;

    async fn launch(&self) -> Result<ScriptedSession, BrowserError> {
        if self.script.fail_launch {
            return Err(BrowserError::Launch("connection refused".to_string()));
        }
        self.log.lock().unwrap().launches += 1;
        Ok(ScriptedSession {
            script: self.script.clone(),
            log: self.log.clone(),
        })
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    type Element = String;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        if self.script.fail_navigate {
            return Err(BrowserError::Command("net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        self.log.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn wait_for_element(
        &mut self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<WaitResult<String>, BrowserError> {
        let mut log = self.log.lock().unwrap();
        let index = log.waits.len();
        log.waits.push(locator.clone());
        if self.script.timeout_on_wait == Some(index) {
            Ok(WaitResult::TimedOut)
        } else {
            Ok(WaitResult::Found(locator.to_string()))
        }
    }

    async fn send_keys(&mut self, element: &String, text: &str) -> Result<(), BrowserError> {
        self.log
            .lock()
            .unwrap()
            .keys
            .push((element.clone(), text.to_string()));
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        Ok(self.script.page_source.clone())
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

pub fn settings() -> ExtractorSettings {
    ExtractorSettings::new(
        "https://sis.example.test/signin",
        "https://sis.example.test/calendar?range=month",
        "student",
        "hunter2",
    )
}

/// Calendar markup with the given JSON (unescaped) embedded in `data-events`.
pub fn calendar_page(events_json: &str) -> String {
    let escaped = events_json.replace('&', "&amp;").replace('"', "&quot;");
    format!(
        r#"<html><body>
<div id="generalCalendar" data-events="{}">
  <span class="fc-event-title">rendered</span>
</div>
</body></html>"#,
        escaped
    )
}
