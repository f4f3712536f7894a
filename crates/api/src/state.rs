use std::sync::Arc;

use sahayata_domain::ports::media::MediaDelegate;
use sahayata_domain::ports::requests::CrisisRequestRepository;
use sahayata_infra::config::AppConfig;
use sahayata_infra::db::DbConfig;
use sahayata_infra::media::HttpMediaDelegate;
use sahayata_infra::repositories::{
    InMemoryCrisisRequestRepository, SurrealCrisisRequestRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub request_repo: Arc<dyn CrisisRequestRepository>,
    pub media: Arc<dyn MediaDelegate>,
}

impl AppState {
    /// Built once at startup; handlers receive clones of the same store and
    /// delegate handles rather than re-initializing per request.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let request_repo: Arc<dyn CrisisRequestRepository> =
            if config.data_backend.eq_ignore_ascii_case("surreal") {
                let db_config = DbConfig::from_app_config(&config);
                Arc::new(SurrealCrisisRequestRepository::connect(&db_config).await?)
            } else {
                Arc::new(InMemoryCrisisRequestRepository::new())
            };
        let media: Arc<dyn MediaDelegate> = Arc::new(HttpMediaDelegate::new(&config)?);
        Ok(Self {
            config,
            request_repo,
            media,
        })
    }

    #[allow(dead_code)]
    pub fn with_parts(
        config: AppConfig,
        request_repo: Arc<dyn CrisisRequestRepository>,
        media: Arc<dyn MediaDelegate>,
    ) -> Self {
        Self {
            config,
            request_repo,
            media,
        }
    }
}
