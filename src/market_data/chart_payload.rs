// =============================================================================
// Quote-Chart Payload Decoding
// =============================================================================
//
// Chart endpoints answer with a column-oriented document:
//
// ```json
// { "chart": { "result": [ {
//     "meta": { "symbol": "^GDAXI", ... },
//     "timestamp": [1700000000, ...],
//     "indicators": { "quote": [ { "open": [...], "high": [...],
//                                  "low": [...], "close": [...] } ] }
// } ], "error": null } }
// ```
//
// Price arrays run parallel to `timestamp` and may hold `null` for bars the
// exchange never filled.  Decoding flattens the columns into bars, drops
// rows without a close and restores the ordering invariant.

use anyhow::{Context, Result};
use tracing::debug;

use super::price_series::{PriceBar, PriceSeries};

/// Decoded chart: the symbol reported by the endpoint plus its bars.
#[derive(Debug, Clone)]
pub struct ChartPayload {
    pub symbol: Option<String>,
    pub series: PriceSeries,
}

/// Parse a chart document from its JSON text.
pub fn parse_chart_payload(text: &str) -> Result<ChartPayload> {
    let root: serde_json::Value =
        serde_json::from_str(text).context("failed to parse chart JSON")?;

    let chart = root.get("chart").context("missing field chart")?;

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let description = err["description"].as_str().unwrap_or("unknown error");
        anyhow::bail!("chart endpoint reported an error: {description}");
    }

    // An absent or empty result means "no data", not a broken document.
    let result = match chart["result"].as_array().and_then(|r| r.first()) {
        Some(result) => result,
        None => {
            debug!("chart payload has no result entries");
            return Ok(ChartPayload {
                symbol: None,
                series: PriceSeries::default(),
            });
        }
    };

    let symbol = result["meta"]["symbol"].as_str().map(str::to_string);

    let timestamps: Vec<i64> = match result["timestamp"].as_array() {
        Some(ts) => ts
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_i64()
                    .with_context(|| format!("timestamp[{i}] is not an integer"))
            })
            .collect::<Result<_>>()?,
        None => Vec::new(),
    };

    let quote = &result["indicators"]["quote"][0];
    let open = parse_price_column(&quote["open"], "open", timestamps.len())?;
    let high = parse_price_column(&quote["high"], "high", timestamps.len())?;
    let low = parse_price_column(&quote["low"], "low", timestamps.len())?;
    let close = parse_price_column(&quote["close"], "close", timestamps.len())?;

    let bars: Vec<PriceBar> = timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| PriceBar::new(ts, open[i], high[i], low[i], close[i]))
        .filter(PriceBar::has_close)
        .collect();

    let dropped = timestamps.len() - bars.len();
    let series = PriceSeries::from_unsorted(bars);

    debug!(
        symbol = ?symbol,
        bars = series.len(),
        dropped,
        "chart payload decoded"
    );

    Ok(ChartPayload { symbol, series })
}

/// Read one price column; `null` entries and a missing column become NaN.
fn parse_price_column(val: &serde_json::Value, name: &str, len: usize) -> Result<Vec<f64>> {
    let entries = match val {
        serde_json::Value::Null => return Ok(vec![f64::NAN; len]),
        serde_json::Value::Array(entries) => entries,
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    };

    if entries.len() != len {
        anyhow::bail!(
            "column {name} has {} entries, expected {len} (one per timestamp)",
            entries.len()
        );
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            serde_json::Value::Null => Ok(f64::NAN),
            serde_json::Value::Number(n) => n
                .as_f64()
                .with_context(|| format!("{name}[{i}] is not a valid f64")),
            _ => anyhow::bail!("{name}[{i}] has unexpected JSON type"),
        })
        .collect()
}
