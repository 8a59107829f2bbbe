use nih_plug::util;

use crate::params::Settings;

/// Shortest time constant the smoothing coefficients are computed for.
pub const MIN_TIME_MS: f32 = 0.001;
/// Used in place of a NaN or infinite sample rate.
pub const FALLBACK_SAMPLE_RATE: f32 = 44100.0;
/// Conversions clamp to this range so the linear value always stays finite.
pub const MIN_DB: f32 = util::MINUS_INFINITY_DB;
pub const MAX_DB: f32 = 100.0;

/// One-pole smoothing weight for a time constant: `1 - exp(-1 / (seconds * sample_rate))`.
///
/// Always in `(0, 1]`. Zero or negative times and sample rates are clamped instead of dividing by
/// zero. A rate that isn't finite at all is treated as [`FALLBACK_SAMPLE_RATE`].
pub fn smoothing_coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    let time_ms = if time_ms.is_finite() {
        time_ms.max(MIN_TIME_MS)
    } else {
        MIN_TIME_MS
    };
    let sample_rate = if sample_rate.is_finite() {
        sample_rate.max(1.0)
    } else {
        FALLBACK_SAMPLE_RATE
    };

    let samples = (time_ms / 1000.0) * sample_rate;
    // `exp_m1()` keeps the long time constants from collapsing to the same value
    -(-samples.recip()).exp_m1()
}

pub fn attack_coefficient(attack_ms: f32, sample_rate: f32) -> f32 {
    smoothing_coefficient(attack_ms, sample_rate)
}

pub fn release_coefficient(release_ms: f32, sample_rate: f32) -> f32 {
    smoothing_coefficient(release_ms, sample_rate)
}

/// `10^(db/20)`, with the input clamped to `[MIN_DB, MAX_DB]`. `MIN_DB` and below map to zero.
pub fn db_to_linear(db: f32) -> f32 {
    if db.is_nan() {
        return 1.0;
    }

    util::db_to_gain(db.clamp(MIN_DB, MAX_DB))
}

/// Everything the envelope follower needs for one block, derived once from a settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockCoefficients {
    pub linear_threshold: f32,
    pub ratio: f32,
    pub attack: f32,
    pub release: f32,
    pub linear_gain: f32,
}

impl BlockCoefficients {
    pub fn new(settings: &Settings, sample_rate: f32) -> Self {
        Self {
            linear_threshold: db_to_linear(settings.threshold_db),
            ratio: settings.ratio.max(1.0),
            attack: attack_coefficient(settings.attack_ms, sample_rate),
            release: release_coefficient(settings.release_ms, sample_rate),
            linear_gain: db_to_linear(settings.gain_db),
        }
    }
}
