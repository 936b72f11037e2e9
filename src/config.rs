// =============================================================================
// Engine Configuration: indicator, trend and forecast parameters
// =============================================================================
//
// Every tunable parameter of the analysis pipeline lives here.  All fields
// carry `#[serde(default)]` so that adding new fields never breaks loading
// an older config file, and a partial JSON document fills the rest with
// defaults.
//
// `save` writes `<name>.tmp` beside the target and renames it into place.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::forecast::RegressorKind;
use crate::indicators::RsiSmoothing;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "^GDAXI".to_string()
}

fn default_ema_spans() -> Vec<usize> {
    vec![20, 50]
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_oversold() -> f64 {
    30.0
}

fn default_overbought() -> f64 {
    70.0
}

fn default_trend_fast_span() -> usize {
    50
}

fn default_trend_slow_span() -> usize {
    200
}

fn default_band_window() -> usize {
    20
}

fn default_lookback() -> usize {
    60
}

fn default_horizon() -> usize {
    5
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> usize {
    12
}

fn default_min_samples_split() -> usize {
    2
}

fn default_seed() -> u64 {
    42
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Spans and periods for the indicator library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// EMA lines to compute over the close column.
    #[serde(default = "default_ema_spans")]
    pub ema_spans: Vec<usize>,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// Rolling mean (default) or Wilder smoothing for RSI averages.
    #[serde(default)]
    pub rsi_smoothing: RsiSmoothing,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// RSI at or below this reads as oversold.
    #[serde(default = "default_oversold")]
    pub oversold: f64,

    /// RSI at or above this reads as overbought.
    #[serde(default = "default_overbought")]
    pub overbought: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_spans: default_ema_spans(),
            rsi_period: default_rsi_period(),
            rsi_smoothing: RsiSmoothing::default(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            oversold: default_oversold(),
            overbought: default_overbought(),
        }
    }
}

// =============================================================================
// TrendParams
// =============================================================================

/// Two-EMA trend spans and the support/resistance window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendParams {
    #[serde(default = "default_trend_fast_span")]
    pub fast_span: usize,

    #[serde(default = "default_trend_slow_span")]
    pub slow_span: usize,

    #[serde(default = "default_band_window")]
    pub band_window: usize,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            fast_span: default_trend_fast_span(),
            slow_span: default_trend_slow_span(),
            band_window: default_band_window(),
        }
    }
}

// =============================================================================
// ForecastParams
// =============================================================================

/// Sliding-window forecaster settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastParams {
    /// Number of trailing closes per feature vector.
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Steps produced by the multi-step forecasts.
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Model family fitted on the windows.
    #[serde(default)]
    pub regressor: RegressorKind,

    /// Random forest: number of trees.
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Random forest: maximum tree depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Random forest: minimum samples required to split a node.
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    /// Seed for bootstrap sampling and feature selection.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            horizon: default_horizon(),
            regressor: RegressorKind::default(),
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            seed: default_seed(),
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Top-level configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Symbol label used when a payload does not name its own.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Price target to assess; the last close when absent.
    #[serde(default)]
    pub target: Option<f64>,

    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub trend: TrendParams,

    #[serde(default)]
    pub forecast: ForecastParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            target: None,
            indicators: IndicatorParams::default(),
            trend: TrendParams::default(),
            forecast: ForecastParams::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing or malformed file is an error so the caller can fall back
    /// to defaults with a warning.  A blank file (e.g. freshly `touch`ed)
    /// reads as the default config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        if content.trim().is_empty() {
            debug!(path = %path.display(), "engine config file is blank, using defaults");
            return Ok(Self::default());
        }

        let config: Self = serde_json::from_str(&content).with_context(|| {
            format!("engine config {} is not a valid neurotrader config", path.display())
        })?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            target = ?config.target,
            regressor = %config.forecast.regressor,
            lookback = config.forecast.lookback,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Write the config as pretty JSON to `path`, creating missing parent
    /// directories.  The file is written next to its destination as
    /// `<name>.tmp` and renamed into place, so readers never see a partial
    /// document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create config directory {}", dir.display()))?;
        }

        let mut content = serde_json::to_string_pretty(self)
            .context("failed to serialise engine config to JSON")?;
        content.push('\n');

        let file_name = path
            .file_name()
            .with_context(|| format!("config path {} has no file name", path.display()))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to move config into place at {}", path.display()))?;

        info!(
            path = %path.display(),
            bytes = content.len(),
            symbol = %self.symbol,
            "engine config written"
        );
        Ok(())
    }

    /// Parameter combinations that compute without failing but yield
    /// meaningless output.  Each finding is also logged.
    pub fn validate(&self) -> Vec<String> {
        let mut findings = Vec::new();

        let ind = &self.indicators;
        if ind.macd_fast >= ind.macd_slow {
            findings.push(format!(
                "MACD fast span {} is not below slow span {}",
                ind.macd_fast, ind.macd_slow
            ));
        }
        if ind.oversold >= ind.overbought {
            findings.push(format!(
                "RSI oversold threshold {} is not below overbought {}",
                ind.oversold, ind.overbought
            ));
        }
        if self.trend.fast_span >= self.trend.slow_span {
            findings.push(format!(
                "trend fast span {} is not below slow span {}",
                self.trend.fast_span, self.trend.slow_span
            ));
        }
        if self.forecast.lookback == 0 {
            findings.push("forecast lookback is zero".to_string());
        }

        for finding in &findings {
            warn!(finding = %finding, "questionable engine config");
        }
        findings
    }
}
