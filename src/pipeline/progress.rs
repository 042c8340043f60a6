//! Run progress: events, observers and a monotonic slot counter.

use crate::model::{Platform, SlotFailure, SlotRef};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunStarted {
        run_id: String,
        total_slots: usize,
    },
    StrategiesReady {
        count: usize,
        attempts: u32,
        used_fallback: bool,
    },
    CopyGenerated {
        platform: Platform,
        produced: usize,
        failed: usize,
    },
    SlotCompleted {
        slot: SlotRef,
        completed: usize,
        total: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        failure: Option<SlotFailure>,
    },
    RunCompleted {
        run_id: String,
        succeeded: usize,
        failed: usize,
        duration_ms: u64,
    },
}

pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Writes every event to the tracing log.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl ProgressObserver for LoggingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RunStarted {
                run_id,
                total_slots,
            } => info!(run_id = %run_id, total_slots, "Pipeline run started"),
            PipelineEvent::StrategiesReady {
                count,
                attempts,
                used_fallback,
            } => info!(count, attempts, used_fallback, "Strategies ready"),
            PipelineEvent::CopyGenerated {
                platform,
                produced,
                failed,
            } => info!(platform = %platform, produced, failed, "Copy generated"),
            PipelineEvent::SlotCompleted {
                slot,
                completed,
                total,
                failure: None,
            } => info!(
                platform = %slot.platform,
                variation = slot.variation + 1,
                completed,
                total,
                "Slot completed"
            ),
            PipelineEvent::SlotCompleted {
                slot,
                completed,
                total,
                failure: Some(failure),
            } => warn!(
                platform = %slot.platform,
                variation = slot.variation + 1,
                stage = %failure.stage,
                error = %failure.message,
                completed,
                total,
                "Slot failed"
            ),
            PipelineEvent::RunCompleted {
                run_id,
                succeeded,
                failed,
                duration_ms,
            } => info!(run_id = %run_id, succeeded, failed, duration_ms, "Pipeline run completed"),
        }
    }
}

/// Shared by concurrently running slots; the counter only moves forward.
pub struct ProgressTracker {
    completed: AtomicUsize,
    total: usize,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ProgressTracker {
    pub fn new(total: usize, observers: Vec<Arc<dyn ProgressObserver>>) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            observers,
        }
    }

    pub fn emit(&self, event: PipelineEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    /// Count one finished slot and publish it. Returns the new completed count.
    pub fn complete_slot(&self, slot: &SlotRef, failure: Option<&SlotFailure>) -> usize {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit(PipelineEvent::SlotCompleted {
            slot: slot.clone(),
            completed,
            total: self.total,
            failure: failure.cloned(),
        });
        completed
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed() as f64 / self.total as f64
        }
    }
}
