use std::sync::Arc;

use anyhow::Context;

use stocktake_api::config::ApiConfig;
use stocktake_infra::erp::seed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    stocktake_observability::init(config.log_format);
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let backend = Arc::new(seed::demo(config.erp_session_id));
    let app = stocktake_api::app::build_app(&config, backend)
        .context("failed to load token verification key")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        location_enforcement = config.location_enforcement,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
