pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::ml::TriageService;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TriageService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<TriageService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }
}
