use std::sync::Arc;

use anyhow::Result;
use surfcast::{ForecastAggregator, SurfcastConfig, api::AppState, logging, web};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = SurfcastConfig::load()?;
    logging::init(&config.logging)?;

    let aggregator = ForecastAggregator::from_config(&config)?;
    info!("Forecast providers: {:?}", aggregator.provider_names());

    let state = Arc::new(AppState::new(aggregator, config.credentials.clone()));
    web::run(&config.server, state).await
}
