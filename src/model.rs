//! Schema Models
//!
//! Typed records threaded through the generation pipeline: the brief that seeds
//! a run, the per-slot artifacts each stage produces, the accumulated pipeline
//! state, and the platform → copy export mapping.

mod brief;
mod creative;
mod export;
mod state;

pub use brief::{CampaignGoal, CreativeBrief, Platform};
pub use creative::{
    AdCopy, AdCreative, RawImage, SlotFailure, SlotRef, Stage, StrategicPrompts,
    STRATEGIC_PROMPT_COUNT,
};
pub use export::AdCopyExport;
pub use state::{PipelineState, SlotOutcome};
