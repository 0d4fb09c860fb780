use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::models::band::membership::EventBus;
use crate::tasks::TaskQueue;

/// Everything a request handler needs, shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tasks: Arc<dyn TaskQueue>,
    pub events: Arc<EventBus>,
    pub config: Arc<Config>,
}
