//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::registry::SessionRegistry;
use crate::settings::SettingsStore;
use crate::stream_api::ReplyMode;

pub struct AppState {
    pub registry: SessionRegistry,
    pub settings: Arc<dyn SettingsStore>,
    /// How computed scores are echoed back over a stream; fixed at startup.
    pub reply_mode: ReplyMode,
    /// Server start time (used for uptime reporting)
    pub start_time: DateTime<Utc>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(settings: Arc<dyn SettingsStore>, reply_mode: ReplyMode) -> Self {
        Self {
            registry: SessionRegistry::new(),
            settings,
            reply_mode,
            start_time: Utc::now(),
        }
    }
}
