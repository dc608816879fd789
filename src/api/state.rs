use std::sync::Arc;

use crate::config::Config;
use crate::listing::{Lister, PartitionSource};
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lister: Arc<Lister>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, source: Arc<dyn PartitionSource>) -> Self {
        let metrics = Arc::new(Metrics::new());
        let lister = Lister::new(source, config.listing.options(), metrics.clone());

        Self {
            config: Arc::new(config),
            lister: Arc::new(lister),
            metrics,
        }
    }
}
