use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            endpoint: config.surreal_endpoint.clone(),
            namespace: config.surreal_ns.clone(),
            database: config.surreal_db.clone(),
            username: config.surreal_user.clone(),
            password: config.surreal_pass.clone(),
        }
    }
}

/// Dialed once at startup; the returned handle is cloned into repositories
/// instead of re-connecting per call.
pub async fn connect(config: &DbConfig) -> anyhow::Result<Arc<Surreal<Client>>> {
    let db = Surreal::<Client>::init();
    db.connect::<Ws>(&config.endpoint).await?;
    db.signin(Root {
        username: &config.username,
        password: &config.password,
    })
    .await?;
    db.use_ns(&config.namespace).use_db(&config.database).await?;

    tracing::debug!(
        endpoint = %config.endpoint,
        namespace = %config.namespace,
        database = %config.database,
        "surreal connection established"
    );
    Ok(Arc::new(db))
}
