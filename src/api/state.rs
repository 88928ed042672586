use std::sync::Arc;

use chrono::NaiveDate;

use crate::cache::{DatasetStore, Snapshot};
use crate::charts::{ChartRenderer, SpecRenderer};
use crate::config::AppConfig;
use crate::resolve;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<tokio::sync::RwLock<DatasetStore>>,
    pub renderer: Arc<dyn ChartRenderer>,
    /// Pinned run date; `None` means the local calendar date per request.
    pub run_date: Option<NaiveDate>,
}

impl AppState {
    pub fn new(config: AppConfig, store: DatasetStore) -> Self {
        let renderer = SpecRenderer::new(config.dashboard.histogram_bins);
        Self {
            config: Arc::new(config),
            store: Arc::new(tokio::sync::RwLock::new(store)),
            renderer: Arc::new(renderer),
            run_date: None,
        }
    }

    pub fn with_run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = Some(run_date);
        self
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date.unwrap_or_else(resolve::today)
    }

    /// Current dataset and its resolution, reloading the source if it changed.
    pub async fn snapshot(&self) -> Snapshot {
        let run_date = self.run_date();
        self.store.write().await.snapshot(run_date)
    }
}
