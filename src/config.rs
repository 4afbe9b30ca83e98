use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub countries_url: String,
    pub rates_url: String,
    pub fetch_timeout_secs: u64,
    pub upstream_rps: u32,
    pub summary_image_path: PathBuf,
    pub font_path: PathBuf,
    pub title_font_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://atlasd.db?mode=rwc".to_string());

        let countries_url =
            std::env::var("COUNTRIES_URL").unwrap_or_else(|_| DEFAULT_COUNTRIES_URL.to_string());
        let rates_url =
            std::env::var("RATES_URL").unwrap_or_else(|_| DEFAULT_RATES_URL.to_string());

        let fetch_timeout_secs: u64 =
            std::env::var("FETCH_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(30);

        let upstream_rps: u32 =
            std::env::var("UPSTREAM_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let summary_image_path = std::env::var("SUMMARY_IMAGE_PATH")
            .unwrap_or_else(|_| "cache/summary.png".to_string())
            .into();

        let font_path = std::env::var("FONT_PATH")
            .unwrap_or_else(|_| "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string())
            .into();
        let title_font_path = std::env::var("TITLE_FONT_PATH")
            .unwrap_or_else(|_| "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf".to_string())
            .into();

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            countries_url,
            rates_url,
            fetch_timeout_secs,
            upstream_rps,
            summary_image_path,
            font_path,
            title_font_path,
        })
    }
}
