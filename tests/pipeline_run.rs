//! End-to-end pipeline runs with a scripted browser and an in-memory store.
mod common;

use common::{BrowserScript, FakeStore, ScriptedLauncher, calendar_page, settings};
use skysync::extract::{CalendarExtractor, ExtractError, WaitStage};
use skysync::pipeline::{ItemReport, NO_EVENTS_MESSAGE, Pipeline};
use skysync::progress::{NullProgress, Progress};
use skysync::sync::Synchronizer;
use std::sync::Arc;

const CALENDAR: &str = r#"[
    {"title": "Essay", "Description": "Write 500 words", "DueDate": "May 3rd, 2024", "Course": "English"},
    {"title": "Reading", "Description": "Chapter 1", "DueDate": "May 6th, 2024"},
    {"title": "Reading", "Description": "Chapter 2", "DueDate": "May 13th, 2024"},
    {"title": "Assembly", "Description": "Gym", "DueDate": "TBD"}
]"#;

fn pipeline(
    launcher: ScriptedLauncher,
    store: Arc<FakeStore>,
) -> Pipeline<ScriptedLauncher, Arc<FakeStore>> {
    Pipeline::new(
        CalendarExtractor::new(launcher, settings()),
        Synchronizer::new(store),
    )
}

#[derive(Default)]
struct RecordingProgress {
    total: Option<usize>,
    done: Vec<(usize, String)>,
    finished: usize,
}

impl Progress for RecordingProgress {
    fn begin(&mut self, total: usize) {
        self.total = Some(total);
    }

    fn item_done(&mut self, index: usize, item: &ItemReport) {
        self.done.push((index, item.title.clone()));
    }

    fn finish(&mut self) {
        self.finished += 1;
    }
}

#[tokio::test]
async fn test_rerun_against_unchanged_calendar_creates_nothing() {
    let store = Arc::new(FakeStore::new());
    let launcher = ScriptedLauncher::with_page(calendar_page(CALENDAR));

    let first = pipeline(launcher.clone(), store.clone())
        .run(&mut NullProgress)
        .await
        .unwrap();
    assert_eq!(first.extracted, 4);
    assert_eq!(first.created(), 4);
    assert_eq!(store.count(), 4);

    let second = pipeline(launcher.clone(), store.clone())
        .run(&mut NullProgress)
        .await
        .unwrap();
    assert_eq!(second.created(), 0);
    assert_eq!(second.skipped(), 4);
    assert_eq!(store.count(), 4);
    assert_eq!(launcher.closes(), 2);
}

#[tokio::test]
async fn test_duplicates_within_one_run_see_earlier_creates() {
    let store = Arc::new(FakeStore::new());
    let twice = r#"[
        {"title": "Quiz", "Description": "Unit 3", "DueDate": "May 3, 2024"},
        {"title": "Quiz", "Description": "Unit 3", "DueDate": "May 3, 2024"}
    ]"#;
    let launcher = ScriptedLauncher::with_page(calendar_page(twice));

    let report = pipeline(launcher, store.clone())
        .run(&mut NullProgress)
        .await
        .unwrap();

    assert_eq!(report.created(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(store.count(), 1);
}

#[tokio::test]
async fn test_render_timeout_reports_no_events() {
    let store = Arc::new(FakeStore::new());
    let launcher = ScriptedLauncher::new(BrowserScript {
        timeout_on_wait: Some(3),
        page_source: calendar_page(CALENDAR),
        ..Default::default()
    });
    let mut progress = RecordingProgress::default();

    let report = pipeline(launcher.clone(), store.clone())
        .run(&mut progress)
        .await
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(report.timeout, Some(WaitStage::EventTitles));
    assert!(report.summary().starts_with(NO_EVENTS_MESSAGE));
    assert!(!report.has_failures());
    assert_eq!(progress.total, None);
    assert!(progress.done.is_empty());
    assert_eq!(progress.finished, 1);
    assert!(store.calls.lock().unwrap().is_empty());
    assert_eq!(launcher.closes(), 1);
}

#[tokio::test]
async fn test_empty_calendar_summary() {
    let store = Arc::new(FakeStore::new());
    let launcher = ScriptedLauncher::with_page(calendar_page("[]"));

    let report = pipeline(launcher, store)
        .run(&mut NullProgress)
        .await
        .unwrap();

    assert_eq!(report.summary(), NO_EVENTS_MESSAGE);
}

#[tokio::test]
async fn test_one_failing_event_does_not_stop_the_batch() {
    let store = Arc::new(FakeStore::new());
    store
        .fail_create_for
        .lock()
        .unwrap()
        .insert("Essay".to_string());
    let launcher = ScriptedLauncher::with_page(calendar_page(CALENDAR));
    let mut progress = RecordingProgress::default();

    let report = pipeline(launcher, store.clone())
        .run(&mut progress)
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.created(), 3);
    assert!(report.has_failures());
    assert!(report.items[0].result.is_err());
    assert_eq!(store.count(), 3);

    assert_eq!(progress.total, Some(4));
    let indices: Vec<usize> = progress.done.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_unparseable_date_still_syncs() {
    let store = Arc::new(FakeStore::new());
    let launcher = ScriptedLauncher::with_page(calendar_page(CALENDAR));

    let report = pipeline(launcher, store)
        .run(&mut NullProgress)
        .await
        .unwrap();

    let assembly = report.items.iter().find(|i| i.title == "Assembly").unwrap();
    assert_eq!(assembly.date, "TBD");
    assert!(!assembly.date_is_iso);
    assert!(assembly.result.is_ok());
    assert_eq!(report.undated(), 1);
}

#[tokio::test]
async fn test_payload_failure_propagates_from_run() {
    let store = Arc::new(FakeStore::new());
    let launcher = ScriptedLauncher::with_page("<html><body>maintenance</body></html>");
    let mut progress = RecordingProgress::default();

    let result = pipeline(launcher.clone(), store.clone())
        .run(&mut progress)
        .await;

    assert!(matches!(result, Err(ExtractError::PayloadParse(_))));
    assert_eq!(progress.finished, 1);
    assert_eq!(store.count(), 0);
    assert_eq!(launcher.closes(), 1);
}
