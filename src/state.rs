use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineSettings;
use crate::engine::ContactTracer;
use crate::models::activity::{Activity, VisitEvent};
use crate::observability::metrics::Metrics;
use crate::store::memory::InMemoryStore;

pub struct AppState {
    pub store: Arc<InMemoryStore>,
    pub tracer: ContactTracer,
    pub clock: Arc<dyn Clock>,
    pub activities: DashMap<Uuid, Activity>,
    pub visit_events_tx: broadcast::Sender<VisitEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(settings: EngineSettings, event_buffer_size: usize) -> Self {
        Self::with_clock(settings, event_buffer_size, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: EngineSettings,
        event_buffer_size: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let tracer = ContactTracer::new(store.clone(), clock.clone(), settings);
        let (visit_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            store,
            tracer,
            clock,
            activities: DashMap::new(),
            visit_events_tx,
            metrics: Metrics::new(),
        }
    }
}
