//! Application state shared across handlers

use crate::config::Settings;
use crate::mcp::EverythingTools;
use crate::metrics::Metrics;
use crate::search::EverythingSearch;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Handle to es, built once at startup
    pub search: EverythingSearch,
    /// Tool dispatch for the `/tools` routes
    pub tools: EverythingTools,
    /// Call statistics
    pub metrics: Arc<Metrics>,
    /// Template renderer
    pub templates: Arc<super::Templates>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, search: EverythingSearch) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let tools = EverythingTools::new(search.clone()).with_metrics(metrics.clone());
        let templates = Arc::new(super::Templates::new()?);

        Ok(Self {
            settings: Arc::new(settings),
            search,
            tools,
            metrics,
            templates,
        })
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
