use std::sync::Arc;

use crate::{clock::Clock, config::Config, content::AccessCoordinator, stores::Stores};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Database, upload directory and rate limiter.
    pub stores: Stores,
    /// Source of "now" for every timer decision.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn coordinator(&self) -> AccessCoordinator {
        AccessCoordinator::new(self.stores.contents.clone(), self.stores.files.clone())
    }
}
