mod config;
mod db;
mod entities;
mod error;
mod gdp;
mod models;
mod reconcile;
mod refresh;
mod routes;
mod store;
mod summary;
mod upstream;

use std::{sync::Arc, time::Duration};

use crate::{config::Config, store::CountryStore, summary::SummaryRenderer, upstream::UpstreamClient};

pub struct AppState {
    pub store: CountryStore,
    pub upstream: UpstreamClient,
    pub summary: SummaryRenderer,
}

impl AppState {
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("atlasd/0.1")
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;

        let db = db::connect_and_migrate(&config.database_url).await?;

        let upstream = UpstreamClient::new(
            http,
            config.countries_url.clone(),
            config.rates_url.clone(),
            config.upstream_rps,
        );

        let summary = SummaryRenderer::new(
            config.summary_image_path.clone(),
            config.font_path.clone(),
            config.title_font_path.clone(),
        );

        Ok(Self { store: CountryStore::new(db), upstream, summary })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,atlasd=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;
    let state = Arc::new(AppState::build(&config).await?);

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
