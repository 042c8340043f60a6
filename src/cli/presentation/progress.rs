//! Progress lines on stderr while a run is in flight.

use crate::pipeline::{PipelineEvent, ProgressObserver};
use owo_colors::OwoColorize;

#[derive(Debug, Default)]
pub struct ProgressPrinter;

impl ProgressPrinter {
    /// Line for `event`, or `None` for events that are only logged.
    pub fn line(event: &PipelineEvent) -> Option<String> {
        match event {
            PipelineEvent::RunStarted { run_id, total_slots } => Some(format!(
                "Run {}: {} slots",
                run_id.bold(),
                total_slots
            )),
            PipelineEvent::StrategiesReady {
                count,
                used_fallback,
                ..
            } => Some(if *used_fallback {
                format!("{} strategic angles ({})", count, "default set".yellow())
            } else {
                format!("{} strategic angles", count)
            }),
            PipelineEvent::CopyGenerated { .. } => None,
            PipelineEvent::SlotCompleted {
                slot,
                completed,
                total,
                failure,
            } => Some(match failure {
                None => format!("[{}/{}] {} {}", completed, total, slot, "done".green()),
                Some(failure) => format!(
                    "[{}/{}] {} {} at {}: {}",
                    completed,
                    total,
                    slot,
                    "failed".red(),
                    failure.stage,
                    failure.message
                ),
            }),
            PipelineEvent::RunCompleted {
                succeeded,
                failed,
                duration_ms,
                ..
            } => Some(format!(
                "Finished: {} succeeded, {} failed in {:.1}s",
                succeeded,
                failed,
                *duration_ms as f64 / 1000.0
            )),
        }
    }
}

impl ProgressObserver for ProgressPrinter {
    fn on_event(&self, event: &PipelineEvent) {
        if let Some(line) = Self::line(event) {
            eprintln!("{}", line);
        }
    }
}
