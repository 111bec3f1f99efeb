use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::media::{MediaProber, Remuxer};
use crate::infrastructure::storage::ObjectStore;
use crate::modules::video::repository::VideoRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub videos: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn ObjectStore>,
    pub prober: Arc<dyn MediaProber>,
    pub remuxer: Arc<dyn Remuxer>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn ObjectStore>,
        prober: Arc<dyn MediaProber>,
        remuxer: Arc<dyn Remuxer>,
    ) -> Self {
        Self {
            config,
            videos,
            storage,
            prober,
            remuxer,
        }
    }
}
