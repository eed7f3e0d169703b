pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

pub use api::{HttpScheduleApi, ScheduleApi};
pub use config::Config;
pub use editor::{EditSession, Reconciler, ScheduleEditor, SnapshotStore};
pub use error::{AppError, EditorError};
pub use services::{EditorRegistry, ReferenceData};

pub struct AppState {
    pub registry: EditorRegistry,
    pub reference: ReferenceData,
}

impl AppState {
    pub fn new(api: Arc<dyn ScheduleApi>, config: &Config) -> Self {
        Self {
            registry: EditorRegistry::new(Arc::clone(&api), config.editor_idle_timeout()),
            reference: ReferenceData::new(api, config.employee_cache_ttl()),
        }
    }
}
