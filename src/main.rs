// =============================================================================
// NeuroTrader: Main Entry Point
// =============================================================================
//
// Usage: neurotrader <chart.json>...
//        neurotrader --write-config [path]
//
// Each argument is a saved quote-chart payload.  The engine prints one
// pretty-JSON `SymbolReport` per readable file; unreadable files are logged
// and skipped.  `--write-config` writes the effective config (file, env
// overrides and defaults merged) to `path`, or to the config path in use.
// =============================================================================

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use neurotrader::config::EngineConfig;
use neurotrader::forecast::ModelCache;
use neurotrader::market_data::parse_chart_payload;
use neurotrader::{analyse, SymbolReport};

const DEFAULT_CONFIG_PATH: &str = "neurotrader.json";

fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        NeuroTrader Analysis Engine: Starting Up          ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var("NEUROTRADER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });

    // Override symbol label and target from env if available.
    if let Ok(symbol) = std::env::var("NEUROTRADER_SYMBOL") {
        let symbol = symbol.trim();
        if !symbol.is_empty() {
            config.symbol = symbol.to_string();
        }
    }
    if let Ok(target) = std::env::var("NEUROTRADER_TARGET") {
        match target.trim().parse::<f64>() {
            Ok(t) if t.is_finite() => config.target = Some(t),
            _ => warn!(value = %target, "Ignoring unparsable NEUROTRADER_TARGET"),
        }
    }

    config.validate();

    info!(
        symbol = %config.symbol,
        target = ?config.target,
        regressor = %config.forecast.regressor,
        lookback = config.forecast.lookback,
        horizon = config.forecast.horizon,
        "Engine configured"
    );

    let mut args = std::env::args().skip(1).peekable();
    if args.peek().map(String::as_str) == Some("--write-config") {
        args.next();
        let target = args.next().unwrap_or(config_path);
        config.save(&target)?;
        return Ok(());
    }

    // ── 2. Analyse every payload ─────────────────────────────────────────
    let paths: Vec<String> = args.collect();
    if paths.is_empty() {
        anyhow::bail!("usage: neurotrader <chart.json>... | --write-config [path]");
    }

    let cache = ModelCache::new();
    let mut reported = 0usize;

    for path in &paths {
        match report_for_file(Path::new(path), &config, &cache) {
            Ok(report) => {
                let json = serde_json::to_string_pretty(&report)
                    .context("failed to serialise symbol report")?;
                println!("{json}");
                reported += 1;
            }
            Err(e) => warn!(path = %path, error = %format!("{e:#}"), "Skipping payload"),
        }
    }

    info!(files = paths.len(), reported, models = cache.len(), "Analysis finished");
    Ok(())
}

fn report_for_file(path: &Path, config: &EngineConfig, cache: &ModelCache) -> anyhow::Result<SymbolReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read chart payload {}", path.display()))?;
    let payload = parse_chart_payload(&text)
        .with_context(|| format!("failed to decode chart payload {}", path.display()))?;

    let symbol = payload.symbol.as_deref().unwrap_or(&config.symbol);
    Ok(analyse(symbol, &payload.series, config, cache))
}
