//! Final recommendation text for a finished run.

use crate::model::{PipelineState, Platform};
use std::collections::HashSet;
use std::fmt::Write as _;

/// Complete slots for one platform: slots with no recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTally {
    pub platform: Platform,
    pub complete: usize,
    pub total: usize,
}

/// Per-platform tallies in first-seen slot order.
pub fn platform_tallies(state: &PipelineState) -> Vec<PlatformTally> {
    let failed: HashSet<_> = state.failures.iter().map(|f| &f.slot).collect();
    let mut tallies: Vec<PlatformTally> = Vec::new();
    for slot in &state.slots {
        let index = match tallies.iter().position(|t| t.platform == slot.platform) {
            Some(index) => index,
            None => {
                tallies.push(PlatformTally {
                    platform: slot.platform.clone(),
                    complete: 0,
                    total: 0,
                });
                tallies.len() - 1
            }
        };
        tallies[index].total += 1;
        if !failed.contains(slot) {
            tallies[index].complete += 1;
        }
    }
    tallies
}

/// Platform with the most complete slots; earlier platforms win ties.
pub fn strongest_platform(state: &PipelineState) -> Option<PlatformTally> {
    platform_tallies(state)
        .into_iter()
        .filter(|t| t.complete > 0)
        .fold(None, |best: Option<PlatformTally>, t| match best {
            Some(b) if b.complete >= t.complete => Some(b),
            _ => Some(t),
        })
}

pub fn recommendation(state: &PipelineState) -> String {
    let total = state.slot_count();
    let visual = state.visual_prompts.iter().flatten().count();
    let mut text = String::new();

    let _ = writeln!(
        text,
        "Run produced {} ad copies, {} visual prompts, {} images and {} composed creatives across {} slots.",
        state.copy_count(),
        visual,
        state.image_count(),
        state.creative_count(),
        total
    );
    if state.strategies_used_fallback {
        let _ = writeln!(
            text,
            "Strategic angles fell back to the default set; consider rerunning for brief-specific angles."
        );
    }
    match strongest_platform(state) {
        Some(best) => {
            let _ = writeln!(
                text,
                "Strongest platform: {} ({}/{} slots complete). Start testing there.",
                best.platform, best.complete, best.total
            );
        }
        None => {
            let _ = writeln!(
                text,
                "No platform produced a complete creative; review the failures below."
            );
        }
    }
    if !state.failures.is_empty() {
        let _ = writeln!(text, "Failures ({}):", state.failures.len());
        for failure in &state.failures {
            let _ = writeln!(text, "- {}", failure);
        }
    }
    text.trim_end().to_string()
}
