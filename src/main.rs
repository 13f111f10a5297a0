use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

mod api;
mod config;
mod engine;
mod model;

use api::AppState;
use config::Config;
use engine::PredictionEngine;
use model::MatchupInput;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    let engine = PredictionEngine::new(config.simulation());
    info!(
        "Simulation defaults: {} draws (cap {}), σ={}, r={}, seed={:?}",
        config.draw_count, config.max_draw_count, config.mc_std_dev, config.nb_dispersion, config.seed
    );

    if let Some(path) = &config.input {
        return run_once(&engine, path, config.compare);
    }

    let app = api::router(AppState { engine });
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Prediction service listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// One-shot mode: predict a single matchup from a JSON file and print the
/// result to stdout.
fn run_once(engine: &PredictionEngine, path: &Path, compare: bool) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading matchup file {}", path.display()))?;
    let matchup: MatchupInput = serde_json::from_str(&raw)
        .with_context(|| format!("parsing matchup file {}", path.display()))?;

    let out = if compare {
        serde_json::to_string_pretty(&engine.compare(&matchup, engine.defaults())?)?
    } else {
        serde_json::to_string_pretty(&engine.predict_default(&matchup)?)?
    };
    println!("{}", out);
    Ok(())
}
