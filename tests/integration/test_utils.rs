//! Shared test utilities for integration tests
//!
//! Scripted backends, clients and briefs used across the integration modules.

use adcraft::model::{CreativeBrief, Platform};
use adcraft::pipeline::{PipelineEvent, ProgressObserver};
use adcraft::provider::{GenerationClient, ScriptedBackend};
use parking_lot::Mutex;
use std::sync::Arc;

pub fn brief() -> CreativeBrief {
    CreativeBrief::new(
        "Insulated steel water bottle that keeps drinks cold for 24 hours",
        "Weekend hikers and trail runners aged 25-40",
        Platform::Facebook,
    )
    .unwrap()
}

/// Client over `backend`, keeping the backend handle for call counters.
pub fn client_for(backend: &Arc<ScriptedBackend>) -> Arc<GenerationClient> {
    Arc::new(GenerationClient::new(backend.clone()))
}

pub fn offline() -> (Arc<ScriptedBackend>, Arc<GenerationClient>) {
    let backend = Arc::new(ScriptedBackend::offline());
    let client = client_for(&backend);
    (backend, client)
}

/// Observer that keeps every event for later assertions.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<PipelineEvent>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }
}

impl ProgressObserver for EventLog {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.lock().push(event.clone());
    }
}
