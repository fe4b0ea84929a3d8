use crate::facade::ProgressTracker;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<ProgressTracker>,
}

impl AppState {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self {
            tracker: Arc::new(tracker),
        }
    }
}
