use crate::config::AppConfig;
use crate::judge::{Judge, OpenAiJudge};
use crate::products::{HttpProductResolver, ProductResolver};
use crate::scans::repo::{HistoryStore, PgHistoryStore};
use crate::users::repo::{PgProfileStore, ProfileStore};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state. Every external collaborator sits behind a
/// trait object so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub profiles: Arc<dyn ProfileStore>,
    pub history: Arc<dyn HistoryStore>,
    pub products: Arc<dyn ProductResolver>,
    pub judge: Arc<dyn Judge>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        let products =
            Arc::new(HttpProductResolver::new(&config.resolver)?) as Arc<dyn ProductResolver>;
        let judge = Arc::new(OpenAiJudge::new(&config.judge)?) as Arc<dyn Judge>;

        Ok(Self::from_parts(db, config, products, judge))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        products: Arc<dyn ProductResolver>,
        judge: Arc<dyn Judge>,
    ) -> Self {
        let profiles = Arc::new(PgProfileStore::new(db.clone())) as Arc<dyn ProfileStore>;
        let history = Arc::new(PgHistoryStore::new(db.clone())) as Arc<dyn HistoryStore>;
        Self {
            db,
            config,
            profiles,
            history,
            products,
            judge,
        }
    }
}
