use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::PollConfig;
use crate::models::event::DispatchEvent;
use crate::observability::metrics::Metrics;
use crate::store::Store;
use crate::suggest::MenuSuggester;

pub struct AppState {
    pub store: Store,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
    pub suggester: Option<Arc<dyn MenuSuggester>>,
    pub max_suggested_dishes: usize,
    pub poll: PollConfig,
}

impl AppState {
    pub fn new(store: Store, event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            store,
            events_tx,
            metrics: Metrics::new(),
            suggester: None,
            max_suggested_dishes: 3,
            poll: PollConfig::default(),
        }
    }

    pub fn with_suggester(mut self, suggester: Arc<dyn MenuSuggester>, max_dishes: usize) -> Self {
        self.suggester = Some(suggester);
        self.max_suggested_dishes = max_dishes;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Nobody listening is fine; boards poll the store anyway.
    pub fn publish(&self, event: DispatchEvent) {
        let _ = self.events_tx.send(event);
    }
}
