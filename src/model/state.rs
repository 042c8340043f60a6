use crate::model::brief::CreativeBrief;
use crate::model::creative::{AdCopy, AdCreative, RawImage, SlotFailure, SlotRef, StrategicPrompts};
use crate::model::export::AdCopyExport;
use serde::{Deserialize, Serialize};

/// Everything one slot produced. Stages that did not run or failed are `None`.
#[derive(Debug, Clone)]
pub struct SlotOutcome {
    pub slot: SlotRef,
    pub copy: Option<AdCopy>,
    pub visual_prompt: Option<String>,
    pub image: Option<RawImage>,
    pub creative: Option<AdCreative>,
    pub failure: Option<SlotFailure>,
}

impl SlotOutcome {
    pub fn empty(slot: SlotRef) -> Self {
        Self {
            slot,
            copy: None,
            visual_prompt: None,
            image: None,
            creative: None,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Accumulator threaded through a run. Per-slot lists are index-aligned:
/// entry `k` of every list belongs to the same slot, and a failed stage
/// leaves `None` in place rather than shortening the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    #[serde(default)]
    pub run_id: String,
    pub brief: CreativeBrief,
    #[serde(default)]
    pub strategic_prompts: Option<StrategicPrompts>,
    #[serde(default)]
    pub strategies_used_fallback: bool,
    #[serde(default)]
    pub slots: Vec<SlotRef>,
    #[serde(default)]
    pub generated_text: Vec<Option<AdCopy>>,
    #[serde(default)]
    pub visual_prompts: Vec<Option<String>>,
    #[serde(default)]
    pub generated_images: Vec<Option<RawImage>>,
    #[serde(default)]
    pub composed_ads: Vec<Option<AdCreative>>,
    #[serde(default)]
    pub failures: Vec<SlotFailure>,
    #[serde(default)]
    pub final_recommendation: Option<String>,
}

impl PipelineState {
    pub fn new(brief: CreativeBrief) -> Self {
        Self {
            run_id: String::new(),
            brief,
            strategic_prompts: None,
            strategies_used_fallback: false,
            slots: Vec::new(),
            generated_text: Vec::new(),
            visual_prompts: Vec::new(),
            generated_images: Vec::new(),
            composed_ads: Vec::new(),
            failures: Vec::new(),
            final_recommendation: None,
        }
    }

    /// Append one slot's results to every list, preserving alignment.
    pub fn record_slot(&mut self, outcome: SlotOutcome) {
        self.slots.push(outcome.slot);
        self.generated_text.push(outcome.copy);
        self.visual_prompts.push(outcome.visual_prompt);
        self.generated_images.push(outcome.image);
        self.composed_ads.push(outcome.creative);
        if let Some(failure) = outcome.failure {
            self.failures.push(failure);
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn copy_count(&self) -> usize {
        self.generated_text.iter().flatten().count()
    }

    pub fn image_count(&self) -> usize {
        self.generated_images.iter().flatten().count()
    }

    pub fn creative_count(&self) -> usize {
        self.composed_ads.iter().flatten().count()
    }

    /// Successful copy grouped per core platform, in slot order.
    pub fn export_copy(&self) -> AdCopyExport {
        let mut export = AdCopyExport::default();
        for copy in self.generated_text.iter().flatten() {
            export.push(&copy.slot.platform, copy.full_text());
        }
        export
    }
}
