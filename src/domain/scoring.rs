//! Strength scoring engine.
//!
//! A fixed, ordered table of ten weighted rules is folded over one set of
//! inputs. Each rule yields at most one tier's points and one explanation
//! entry; the relative-strength rule yields nothing at all when no benchmark
//! reading is available. A negative adjustment (the volatility penalty)
//! floors the running total at 0 at the point where it is applied, so later
//! rules still add on top of the floored value. The final score is capped
//! at 100.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::{OhlcvBar, series_code};
use crate::domain::relative_strength::{RelativeStrength, RsTrend, calculate_relative_strength};
use crate::domain::snapshot::{IndicatorSnapshot, compute_snapshot, round2};

pub const MAX_SCORE: i32 = 100;
pub const BULLISH_THRESHOLD: u8 = 70;
pub const NEUTRAL_THRESHOLD: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendLabel {
    Bullish,
    Neutral,
    Weak,
}

impl TrendLabel {
    pub fn from_score(score: u8) -> Self {
        if score >= BULLISH_THRESHOLD {
            TrendLabel::Bullish
        } else if score >= NEUTRAL_THRESHOLD {
            TrendLabel::Neutral
        } else {
            TrendLabel::Weak
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendLabel::Bullish => "Bullish",
            TrendLabel::Neutral => "Neutral",
            TrendLabel::Weak => "Weak",
        };
        f.pad(s)
    }
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub snapshot: &'a IndicatorSnapshot,
    pub relative_strength: Option<&'a RelativeStrength>,
    pub price: f64,
    pub volume: f64,
}

/// One rule's contribution: explanation key, point delta, reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub key: &'static str,
    pub points: i32,
    pub reason: &'static str,
}

impl RuleOutcome {
    fn new(key: &'static str, points: i32, reason: &'static str) -> Self {
        Self {
            key,
            points,
            reason,
        }
    }

    /// e.g. `+15 (Strong uptrend - EMA 10 > 20 > 50)` or `-5 (...)`.
    pub fn describe(&self) -> String {
        if self.points > 0 {
            format!("+{} ({})", self.points, self.reason)
        } else {
            format!("{} ({})", self.points, self.reason)
        }
    }
}

pub struct ScoreRule {
    pub name: &'static str,
    /// Largest positive contribution; the penalty rule has 0.
    pub max_points: i32,
    pub evaluate: fn(&ScoringInputs) -> Option<RuleOutcome>,
}

impl ScoreRule {
    const fn new(
        name: &'static str,
        max_points: i32,
        evaluate: fn(&ScoringInputs) -> Option<RuleOutcome>,
    ) -> Self {
        Self {
            name,
            max_points,
            evaluate,
        }
    }
}

fn rule_relative_strength(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let rs = inp.relative_strength?;
    Some(if rs.is_new_high {
        RuleOutcome::new("rs_new_high", 20, "RS at new high vs benchmark")
    } else if rs.trend == RsTrend::Outperforming {
        RuleOutcome::new("rs_outperforming", 12, "Outperforming benchmark")
    } else {
        RuleOutcome::new("rs_underperforming", 0, "Underperforming benchmark")
    })
}

fn rule_ema_alignment(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let e = &inp.snapshot.emas;
    Some(if e.ema_10 > e.ema_20 && e.ema_20 > e.ema_50 {
        RuleOutcome::new("ema_alignment", 15, "Strong uptrend - EMA 10 > 20 > 50")
    } else if e.ema_10 > e.ema_20 {
        RuleOutcome::new("ema_partial", 8, "Short-term uptrend")
    } else {
        RuleOutcome::new("ema_weak", 0, "No clear uptrend")
    })
}

fn rule_rsi_zone(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let rsi = inp.snapshot.rsi;
    Some(if (55.0..=75.0).contains(&rsi) {
        RuleOutcome::new("rsi_strong", 12, "RSI in strong zone 55-75")
    } else if (45.0..55.0).contains(&rsi) {
        RuleOutcome::new("rsi_moderate", 6, "RSI neutral")
    } else if rsi > 80.0 {
        RuleOutcome::new("rsi_overbought", 0, "RSI overbought - caution")
    } else {
        RuleOutcome::new("rsi_weak", 0, "RSI weak")
    })
}

fn rule_macd_momentum(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let m = &inp.snapshot.macd;
    Some(if m.is_bullish && m.histogram > 0.0 {
        RuleOutcome::new("macd_bullish", 10, "MACD bullish crossover")
    } else if m.is_bullish {
        RuleOutcome::new("macd_positive", 5, "MACD above signal")
    } else {
        RuleOutcome::new("macd_bearish", 0, "MACD bearish")
    })
}

fn rule_adx_strength(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let adx = inp.snapshot.adx;
    Some(if adx >= 25.0 {
        RuleOutcome::new("adx_strong", 10, "Strong trend - ADX >= 25")
    } else if adx >= 20.0 {
        RuleOutcome::new("adx_moderate", 5, "Moderate trend")
    } else {
        RuleOutcome::new("adx_weak", 0, "Weak trend")
    })
}

fn rule_volume_confirmation(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let ratio = inp.snapshot.volume_ratio;
    Some(if ratio > 1.5 {
        RuleOutcome::new("volume_high", 8, "High volume confirmation")
    } else if ratio > 1.0 {
        RuleOutcome::new("volume_moderate", 4, "Above average volume")
    } else {
        RuleOutcome::new("volume_low", 0, "Low volume")
    })
}

fn rule_sma_rising(inp: &ScoringInputs) -> Option<RuleOutcome> {
    Some(if inp.snapshot.sma_50.is_rising {
        RuleOutcome::new("sma_rising", 8, "50-SMA rising")
    } else {
        RuleOutcome::new("sma_falling", 0, "50-SMA not rising")
    })
}

fn rule_volatility_penalty(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let vol = inp.snapshot.volatility;
    Some(if vol > 50.0 {
        RuleOutcome::new("volatility_high", -10, "High volatility penalty")
    } else if vol > 35.0 {
        RuleOutcome::new("volatility_moderate", -5, "Moderate volatility penalty")
    } else {
        RuleOutcome::new("volatility_low", 0, "Acceptable volatility")
    })
}

fn rule_price_vs_ema(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let e = &inp.snapshot.emas;
    Some(if inp.price > e.ema_50 {
        RuleOutcome::new("price_above_ema", 7, "Price > 50 EMA")
    } else if inp.price > e.ema_20 {
        RuleOutcome::new("price_above_ema", 3, "Price > 20 EMA")
    } else {
        RuleOutcome::new("price_below_ema", 0, "Price below key EMAs")
    })
}

fn rule_liquidity(inp: &ScoringInputs) -> Option<RuleOutcome> {
    let traded = inp.price * inp.volume;
    Some(if traded > 10_000_000.0 {
        RuleOutcome::new("liquidity", 10, "High liquidity")
    } else if traded > 5_000_000.0 {
        RuleOutcome::new("liquidity", 5, "Moderate liquidity")
    } else {
        RuleOutcome::new("liquidity", 0, "Low liquidity")
    })
}

/// The rule table, in evaluation order. Order is part of the output.
pub const RULES: [ScoreRule; 10] = [
    ScoreRule::new("relative_strength", 20, rule_relative_strength),
    ScoreRule::new("ema_alignment", 15, rule_ema_alignment),
    ScoreRule::new("rsi_zone", 12, rule_rsi_zone),
    ScoreRule::new("macd_momentum", 10, rule_macd_momentum),
    ScoreRule::new("adx_strength", 10, rule_adx_strength),
    ScoreRule::new("volume_confirmation", 8, rule_volume_confirmation),
    ScoreRule::new("sma_rising", 8, rule_sma_rising),
    ScoreRule::new("volatility_penalty", 0, rule_volatility_penalty),
    ScoreRule::new("price_vs_ema", 7, rule_price_vs_ema),
    ScoreRule::new("liquidity", 10, rule_liquidity),
];

/// Result of folding the rule table; no identity or timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleScore {
    pub score: u8,
    pub trend: TrendLabel,
    pub explanation: IndexMap<String, String>,
}

fn apply(total: i32, outcome: &RuleOutcome) -> i32 {
    if outcome.points < 0 {
        (total + outcome.points).max(0)
    } else {
        total + outcome.points
    }
}

pub fn score_inputs(inputs: &ScoringInputs) -> RuleScore {
    let (total, explanation) = RULES
        .iter()
        .filter_map(|rule| (rule.evaluate)(inputs).map(|o| (rule.name, o)))
        .fold(
            (0i32, IndexMap::new()),
            |(total, mut explanation), (name, outcome)| {
                debug!(rule = name, key = outcome.key, points = outcome.points, "score rule");
                explanation.insert(outcome.key.to_string(), outcome.describe());
                (apply(total, &outcome), explanation)
            },
        );

    let score = total.clamp(0, MAX_SCORE) as u8;
    RuleScore {
        score,
        trend: TrendLabel::from_score(score),
        explanation,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub symbol: String,
    pub strength_score: u8,
    pub trend: TrendLabel,
    pub explanation: IndexMap<String, String>,
    pub indicators: IndicatorSnapshot,
    pub current_price: f64,
    pub relative_strength: Option<RelativeStrength>,
    pub timestamp: DateTime<Utc>,
}

/// Score one series, optionally against a benchmark series.
///
/// A missing or empty benchmark, or one sharing no dates with the series,
/// leaves the relative-strength rule out of the result. Anything short of a
/// full indicator snapshot fails the call with `DataInsufficient`.
pub fn score(
    series: &[OhlcvBar],
    benchmark: Option<&[OhlcvBar]>,
) -> Result<ScoreResult, TrendscoreError> {
    let snapshot = compute_snapshot(series)?;
    let last = series
        .last()
        .ok_or_else(|| TrendscoreError::insufficient(series_code(series), 0, 1))?;

    let relative_strength = match benchmark.filter(|b| !b.is_empty()) {
        Some(bench) => match calculate_relative_strength(series, bench) {
            Ok(rs) => Some(rs),
            Err(e) => {
                warn!(
                    code = %last.code,
                    error = %e,
                    "benchmark unusable, scoring without relative strength"
                );
                None
            }
        },
        None => None,
    };

    let inputs = ScoringInputs {
        snapshot: &snapshot,
        relative_strength: relative_strength.as_ref(),
        price: last.close,
        volume: last.volume as f64,
    };
    let scored = score_inputs(&inputs);
    debug!(code = %last.code, score = scored.score, trend = %scored.trend, "scored");

    Ok(ScoreResult {
        symbol: last.code.clone(),
        strength_score: scored.score,
        trend: scored.trend,
        explanation: scored.explanation,
        indicators: snapshot.rounded(),
        current_price: round2(last.close),
        relative_strength: relative_strength.map(|rs| rs.rounded()),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::{EmaSet, MacdReading, SmaReading};

    fn neutral_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            emas: EmaSet {
                ema_10: 100.0,
                ema_20: 100.0,
                ema_50: 100.0,
            },
            rsi: 30.0,
            macd: MacdReading {
                macd: 0.0,
                signal: 0.0,
                histogram: 0.0,
                is_bullish: false,
            },
            adx: 10.0,
            atr: 1.0,
            volatility: 20.0,
            sma_50: SmaReading {
                value: 100.0,
                is_rising: false,
            },
            volume_ratio: 0.8,
        }
    }

    fn rs(is_new_high: bool, trend: RsTrend) -> RelativeStrength {
        RelativeStrength {
            current_rs: 110.0,
            max_rs: 120.0,
            is_new_high,
            trend,
            vs_benchmark_percent: 10.0,
        }
    }

    fn run(
        snapshot: &IndicatorSnapshot,
        rs: Option<&RelativeStrength>,
        price: f64,
        volume: f64,
    ) -> RuleScore {
        score_inputs(&ScoringInputs {
            snapshot,
            relative_strength: rs,
            price,
            volume,
        })
    }

    #[test]
    fn rule_weights_sum_to_max_score() {
        let total: i32 = RULES.iter().map(|r| r.max_points).sum();
        assert_eq!(total, MAX_SCORE);
    }

    #[test]
    fn nothing_fires_scores_zero() {
        let r = run(&neutral_snapshot(), None, 100.0, 10.0);
        assert_eq!(r.score, 0);
        assert_eq!(r.trend, TrendLabel::Weak);
        assert_eq!(r.explanation.len(), 9);
    }

    #[test]
    fn relative_strength_rule_is_omitted_without_benchmark() {
        let r = run(&neutral_snapshot(), None, 100.0, 10.0);
        assert!(r.explanation.keys().all(|k| !k.starts_with("rs_")));

        let lagging = rs(false, RsTrend::Underperforming);
        let with = run(&neutral_snapshot(), Some(&lagging), 100.0, 10.0);
        assert_eq!(with.explanation.len(), 10);
        assert_eq!(with.explanation.get_index(0).unwrap().0, "rs_underperforming");
        assert_eq!(with.explanation["rs_underperforming"], "0 (Underperforming benchmark)");
    }

    #[test]
    fn relative_strength_tiers() {
        let snap = neutral_snapshot();
        let high = rs(true, RsTrend::Underperforming);
        let out = rs(false, RsTrend::Outperforming);
        assert_eq!(run(&snap, Some(&high), 100.0, 10.0).score, 20);
        assert_eq!(run(&snap, Some(&out), 100.0, 10.0).score, 12);
    }

    #[test]
    fn explanation_follows_rule_order() {
        let mut snap = neutral_snapshot();
        snap.emas = EmaSet {
            ema_10: 103.0,
            ema_20: 102.0,
            ema_50: 101.0,
        };
        snap.rsi = 60.0;
        snap.volatility = 60.0;
        let r = run(&snap, Some(&rs(true, RsTrend::Outperforming)), 104.0, 200_000.0);
        let keys: Vec<&str> = r.explanation.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "rs_new_high",
                "ema_alignment",
                "rsi_strong",
                "macd_bearish",
                "adx_weak",
                "volume_low",
                "sma_falling",
                "volatility_high",
                "price_above_ema",
                "liquidity",
            ]
        );
        assert_eq!(r.explanation["volatility_high"], "-10 (High volatility penalty)");
        assert_eq!(r.explanation["ema_alignment"], "+15 (Strong uptrend - EMA 10 > 20 > 50)");
        // 20 + 15 + 12 - 10 + 7 + 10
        assert_eq!(r.score, 54);
        assert_eq!(r.trend, TrendLabel::Neutral);
    }

    #[test]
    fn penalty_floors_running_total_before_later_rules() {
        let mut snap = neutral_snapshot();
        snap.volume_ratio = 1.2; // +4
        snap.volatility = 55.0; // -10, floored to 0
        // price above ema_50 (+7) and high liquidity (+10) after the floor
        let r = run(&snap, None, 101.0, 1_000_000.0);
        assert_eq!(r.score, 17);
    }

    #[test]
    fn moderate_penalty() {
        let mut snap = neutral_snapshot();
        snap.sma_50.is_rising = true; // +8
        snap.volatility = 40.0; // -5
        assert_eq!(run(&snap, None, 100.0, 10.0).score, 3);
    }

    #[test]
    fn rsi_zone_boundaries() {
        let mut snap = neutral_snapshot();
        for (rsi, pts, key) in [
            (55.0, 12, "rsi_strong"),
            (75.0, 12, "rsi_strong"),
            (45.0, 6, "rsi_moderate"),
            (54.99, 6, "rsi_moderate"),
            (78.0, 0, "rsi_weak"),
            (85.0, 0, "rsi_overbought"),
            (44.9, 0, "rsi_weak"),
        ] {
            snap.rsi = rsi;
            let r = run(&snap, None, 100.0, 10.0);
            assert_eq!(r.score, pts, "rsi {}", rsi);
            assert!(r.explanation.contains_key(key), "rsi {}", rsi);
        }
    }

    #[test]
    fn macd_bullish_with_zero_histogram_is_partial() {
        let mut snap = neutral_snapshot();
        snap.macd = MacdReading {
            macd: 1.0,
            signal: 1.0,
            histogram: 0.0,
            is_bullish: true,
        };
        let r = run(&snap, None, 100.0, 10.0);
        assert_eq!(r.score, 5);
        assert!(r.explanation.contains_key("macd_positive"));
    }

    #[test]
    fn adx_and_volume_tiers() {
        let mut snap = neutral_snapshot();
        snap.adx = 20.0;
        snap.volume_ratio = 1.5;
        assert_eq!(run(&snap, None, 100.0, 10.0).score, 5 + 4);
        snap.adx = 25.0;
        snap.volume_ratio = 1.51;
        assert_eq!(run(&snap, None, 100.0, 10.0).score, 10 + 8);
    }

    #[test]
    fn price_and_liquidity_tiers() {
        let mut snap = neutral_snapshot();
        snap.emas = EmaSet {
            ema_10: 98.0,
            ema_20: 99.0,
            ema_50: 101.0,
        };
        // above ema_20 only: +3; 100 * 60_000 = 6M: +5
        let r = run(&snap, None, 100.0, 60_000.0);
        assert_eq!(r.score, 8);
        assert_eq!(r.explanation["price_above_ema"], "+3 (Price > 20 EMA)");
        assert_eq!(r.explanation["liquidity"], "+5 (Moderate liquidity)");
    }

    #[test]
    fn bullish_scenario() {
        let snap = IndicatorSnapshot {
            emas: EmaSet {
                ema_10: 158.0,
                ema_20: 153.0,
                ema_50: 140.0,
            },
            rsi: 65.0,
            macd: MacdReading {
                macd: 5.0,
                signal: 4.0,
                histogram: 1.0,
                is_bullish: true,
            },
            adx: 30.0,
            atr: 2.0,
            volatility: 10.0,
            sma_50: SmaReading {
                value: 135.0,
                is_rising: true,
            },
            volume_ratio: 2.0,
        };
        let r = run(&snap, None, 160.0, 1000.0);
        // 15 + 12 + 10 + 10 + 8 + 8 + 7
        assert_eq!(r.score, 70);
        assert_eq!(r.trend, TrendLabel::Bullish);
    }

    #[test]
    fn trend_thresholds() {
        assert_eq!(TrendLabel::from_score(100), TrendLabel::Bullish);
        assert_eq!(TrendLabel::from_score(70), TrendLabel::Bullish);
        assert_eq!(TrendLabel::from_score(69), TrendLabel::Neutral);
        assert_eq!(TrendLabel::from_score(40), TrendLabel::Neutral);
        assert_eq!(TrendLabel::from_score(39), TrendLabel::Weak);
        assert_eq!(TrendLabel::Neutral.to_string(), "Neutral");
    }

    #[test]
    fn describe_formats_sign() {
        assert_eq!(RuleOutcome::new("k", 8, "r").describe(), "+8 (r)");
        assert_eq!(RuleOutcome::new("k", 0, "r").describe(), "0 (r)");
        assert_eq!(RuleOutcome::new("k", -5, "r").describe(), "-5 (r)");
    }
}
