use crate::config::AppConfig;
use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

// surrealdb and its websocket stack are chatty at info; keep them at warn
// unless the operator widens the filter explicitly.
fn default_directives(level: &str) -> String {
    format!("{level},hyper=warn,surrealdb=warn,tungstenite=warn")
}

pub fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_new(default_directives(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new(default_directives("info")));

    if config.is_production() {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .with_target(false)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    Ok(())
}
