//! Indicator snapshot: the latest value of every indicator the scoring and
//! projection engines consume, computed fresh from one OHLCV series.

use serde::Serialize;
use tracing::debug;

use crate::domain::error::TrendscoreError;
use crate::domain::indicator::adx::calculate_adx;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::macd::calculate_macd_default;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::{calculate_sma, sma_with_slope};
use crate::domain::indicator::volatility::calculate_volatility;
use crate::domain::indicator::volume::volume_ratio;
use crate::domain::indicator::{IndicatorSeries, IndicatorValue};
use crate::domain::ohlcv::{OhlcvBar, series_code};

pub const RSI_PERIOD: usize = 14;
pub const ADX_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const SMA_PERIOD: usize = 50;
pub const SMA_SLOPE_LOOKBACK: usize = 5;
pub const VOLATILITY_PERIOD: usize = 20;
pub const VOLUME_PERIOD: usize = 20;

/// Bars needed before every indicator in the snapshot has a value; EMA(50)
/// and SMA(50) are the longest windows.
pub const MIN_SNAPSHOT_BARS: usize = 50;

/// Round half away from zero to 2 decimals, the precision of every reported
/// figure.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmaSet {
    pub ema_10: f64,
    pub ema_20: f64,
    pub ema_50: f64,
}

/// MACD(12,26,9) at the latest bar. The three values are stored rounded to
/// 2 decimals; `is_bullish` compares the unrounded line and signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdReading {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub is_bullish: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmaReading {
    pub value: f64,
    pub is_rising: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub emas: EmaSet,
    pub rsi: f64,
    pub macd: MacdReading,
    pub adx: f64,
    pub atr: f64,
    /// Annualized, in percent.
    pub volatility: f64,
    pub sma_50: SmaReading,
    pub volume_ratio: f64,
}

impl IndicatorSnapshot {
    /// Reporting form: oscillators, ATR, volatility, SMA and volume ratio
    /// rounded to 2 decimals. EMAs are reported as computed.
    pub fn rounded(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            emas: self.emas,
            rsi: round2(self.rsi),
            macd: self.macd,
            adx: round2(self.adx),
            atr: round2(self.atr),
            volatility: round2(self.volatility),
            sma_50: SmaReading {
                value: round2(self.sma_50.value),
                is_rising: self.sma_50.is_rising,
            },
            volume_ratio: round2(self.volume_ratio),
        }
    }
}

fn require(
    value: Option<f64>,
    bars: &[OhlcvBar],
    minimum: usize,
) -> Result<f64, TrendscoreError> {
    value.ok_or_else(|| TrendscoreError::insufficient(series_code(bars), bars.len(), minimum))
}

fn last_of(
    series: &IndicatorSeries,
    bars: &[OhlcvBar],
    minimum: usize,
) -> Result<f64, TrendscoreError> {
    require(series.last_simple(), bars, minimum)
}

/// Latest EMA(10/20/50) only; what the projection engine needs.
pub fn compute_emas(bars: &[OhlcvBar]) -> Result<EmaSet, TrendscoreError> {
    Ok(EmaSet {
        ema_10: last_of(&calculate_ema(bars, 10), bars, 10)?,
        ema_20: last_of(&calculate_ema(bars, 20), bars, 20)?,
        ema_50: last_of(&calculate_ema(bars, 50), bars, 50)?,
    })
}

fn compute_macd(bars: &[OhlcvBar]) -> Result<MacdReading, TrendscoreError> {
    let series = calculate_macd_default(bars);
    match series.last_valid().map(|p| &p.value) {
        Some(IndicatorValue::Macd {
            line,
            signal,
            histogram,
        }) => Ok(MacdReading {
            macd: round2(*line),
            signal: round2(*signal),
            histogram: round2(*histogram),
            is_bullish: line > signal,
        }),
        _ => Err(TrendscoreError::insufficient(series_code(bars), bars.len(), 34)),
    }
}

/// Compute the full snapshot from the most recent bar of `bars`.
///
/// Fails with `DataInsufficient` if the series is empty or any indicator
/// lacks the bars its window needs; no value is ever defaulted.
pub fn compute_snapshot(bars: &[OhlcvBar]) -> Result<IndicatorSnapshot, TrendscoreError> {
    if bars.len() < MIN_SNAPSHOT_BARS {
        return Err(TrendscoreError::insufficient(
            series_code(bars),
            bars.len(),
            MIN_SNAPSHOT_BARS,
        ));
    }

    let emas = compute_emas(bars)?;
    let rsi = last_of(&calculate_rsi(bars, RSI_PERIOD), bars, RSI_PERIOD + 1)?;
    let macd = compute_macd(bars)?;
    let adx = last_of(&calculate_adx(bars, ADX_PERIOD), bars, 2 * ADX_PERIOD)?;
    let atr = last_of(&calculate_atr(bars, ATR_PERIOD), bars, ATR_PERIOD)?;
    let volatility = last_of(
        &calculate_volatility(bars, VOLATILITY_PERIOD),
        bars,
        VOLATILITY_PERIOD + 1,
    )?;
    let sma = calculate_sma(bars, SMA_PERIOD);
    let (sma_value, sma_rising) = sma_with_slope(&sma, SMA_SLOPE_LOOKBACK)
        .ok_or_else(|| TrendscoreError::insufficient(series_code(bars), bars.len(), SMA_PERIOD))?;
    let volume_ratio = require(volume_ratio(bars, VOLUME_PERIOD), bars, VOLUME_PERIOD)?;

    let snapshot = IndicatorSnapshot {
        emas,
        rsi,
        macd,
        adx,
        atr,
        volatility,
        sma_50: SmaReading {
            value: sma_value,
            is_rising: sma_rising,
        },
        volume_ratio,
    };
    debug!(code = series_code(bars), bars = bars.len(), ?snapshot, "computed indicator snapshot");
    Ok(snapshot)
}
