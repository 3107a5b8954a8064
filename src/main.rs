//! WORDCACHE - Word translation cache over the Google Translate web endpoint

mod config;
mod consts;
mod logic;
mod network;
mod store;
mod translate;
mod utils;
mod web;

use crate::config::Config;
use crate::network::TranslateEngine;
use crate::store::SqliteStore;
use crate::web::AppState;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let config = Config::from_env()?;
    log::info!("═══════════════════════════════════════════");
    log::info!("  WORDCACHE ONLINE. UPSTREAM {}", config.google_url);
    log::info!("═══════════════════════════════════════════");

    let store = SqliteStore::open(&config.database_path)?;
    let engine = TranslateEngine::new(&config)?;

    let state = AppState {
        store: Arc::new(store),
        translator: Arc::new(engine),
        default_lang: config.default_target_lang.clone(),
    };
    web::serve(config.bind_addr, state).await?;
    Ok(())
}
