// File: ./src/pipeline.rs
//! Extraction -> normalization -> synchronization, strictly in sequence.
//!
//! Events are upserted one at a time so every lookup sees the records
//! created earlier in the same run.
use crate::extract::{BrowserLauncher, CalendarExtractor, ExtractError, WaitStage};
use crate::model::{NormalizedEvent, normalize};
use crate::progress::Progress;
use crate::store::RecordStore;
use crate::sync::{CoursePatch, Synchronizer, UpsertOutcome};

pub const NO_EVENTS_MESSAGE: &str = "No events found on the calendar.";

/// Result of syncing a single event.
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub title: String,
    pub date: String,
    pub date_is_iso: bool,
    /// Store failures are kept as text so one bad record never stops the batch.
    pub result: Result<UpsertOutcome, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub extracted: usize,
    /// Set when extraction stopped on a wait timeout.
    pub timeout: Option<WaitStage>,
    pub items: Vec<ItemReport>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.extracted == 0
    }

    pub fn created(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.result, Ok(UpsertOutcome::Created { .. })))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.result, Ok(UpsertOutcome::Skipped { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_err()).count()
    }

    pub fn course_patch_failures(&self) -> usize {
        self.items
            .iter()
            .filter(|i| {
                matches!(
                    i.result,
                    Ok(UpsertOutcome::Created {
                        course: CoursePatch::Failed(_),
                        ..
                    })
                )
            })
            .count()
    }

    pub fn undated(&self) -> usize {
        self.items.iter().filter(|i| !i.date_is_iso).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn summary(&self) -> String {
        if self.is_empty() {
            return match self.timeout {
                Some(stage) => format!(
                    "{} (timed out waiting for the {})",
                    NO_EVENTS_MESSAGE, stage
                ),
                None => NO_EVENTS_MESSAGE.to_string(),
            };
        }
        let mut s = format!(
            "Finished processing {} events: {} created, {} skipped, {} failed.",
            self.extracted,
            self.created(),
            self.skipped(),
            self.failed()
        );
        if self.course_patch_failures() > 0 {
            s.push_str(&format!(
                " Course could not be set on {} new records.",
                self.course_patch_failures()
            ));
        }
        if self.undated() > 0 {
            s.push_str(&format!(
                " {} events kept their original date text.",
                self.undated()
            ));
        }
        s
    }
}

pub struct Pipeline<L: BrowserLauncher, S: RecordStore> {
    extractor: CalendarExtractor<L>,
    synchronizer: Synchronizer<S>,
}

impl<L: BrowserLauncher, S: RecordStore> Pipeline<L, S> {
    pub fn new(extractor: CalendarExtractor<L>, synchronizer: Synchronizer<S>) -> Self {
        Self {
            extractor,
            synchronizer,
        }
    }

    pub fn synchronizer(&self) -> &Synchronizer<S> {
        &self.synchronizer
    }

    /// Extract once and normalize every record. Timeouts yield an empty list.
    pub async fn extract_normalized(
        &self,
    ) -> Result<(Vec<NormalizedEvent>, Option<WaitStage>), ExtractError> {
        let extraction = self.extractor.extract().await?;
        let events = extraction.events.iter().map(normalize).collect();
        Ok((events, extraction.timeout))
    }

    /// Full run. Only extraction errors (browser failure, unreadable payload)
    /// are returned as `Err`; per-event store failures land in the report.
    pub async fn run(&self, progress: &mut dyn Progress) -> Result<RunReport, ExtractError> {
        let (events, timeout) = match self.extract_normalized().await {
            Ok(v) => v,
            Err(e) => {
                progress.finish();
                return Err(e);
            }
        };

        let mut report = RunReport {
            extracted: events.len(),
            timeout,
            items: Vec::with_capacity(events.len()),
        };

        if events.is_empty() {
            log::info!("{}", report.summary());
            progress.finish();
            return Ok(report);
        }

        report.items = self.sync_all(&events, progress).await;
        progress.finish();
        Ok(report)
    }

    /// Upsert each event in order, isolating failures per event.
    pub async fn sync_all(
        &self,
        events: &[NormalizedEvent],
        progress: &mut dyn Progress,
    ) -> Vec<ItemReport> {
        progress.begin(events.len());
        let mut items = Vec::with_capacity(events.len());

        for (index, event) in events.iter().enumerate() {
            let result = self.synchronizer.upsert(event).await.map_err(|e| {
                log::error!("Failed to sync '{}': {}", event.title, e);
                e.to_string()
            });
            let item = ItemReport {
                title: event.title.clone(),
                date: event.date.clone(),
                date_is_iso: event.date_is_iso,
                result,
            };
            progress.item_done(index, &item);
            items.push(item);
        }
        items
    }
}
