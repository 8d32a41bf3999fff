// File: ./src/progress.rs
//! Lightweight progress reporting for a pipeline run.
//! The binary prints to the terminal; tests use `NullProgress` or record calls.
use crate::pipeline::ItemReport;
use crate::sync::{CoursePatch, UpsertOutcome};

pub trait Progress {
    /// Called once extraction is done, with the number of events to sync.
    fn begin(&mut self, _total: usize) {}

    /// Called after each event's upsert, successful or not. `index` is 0-based.
    fn item_done(&mut self, _index: usize, _item: &ItemReport) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Prints one line per event to stdout.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        if total > 0 {
            println!("Syncing {} events...", total);
        }
    }

    fn item_done(&mut self, index: usize, item: &ItemReport) {
        let status = match &item.result {
            Ok(UpsertOutcome::Created { course, .. }) => match course {
                CoursePatch::Failed(e) => format!("created (course not set: {})", e),
                _ => "created".to_string(),
            },
            Ok(UpsertOutcome::Skipped { .. }) => "already exists, skipped".to_string(),
            Err(e) => format!("FAILED: {}", e),
        };
        println!("[{}/{}] {}: {}", index + 1, self.total, item.title, status);
    }
}
