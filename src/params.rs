//! The five compressor controls.
//!
//! [`SqueezeParams`] is what the plugin host automates and persists. [`ParamSlots`] holds the
//! same values in bare atomic slots for hosts that don't go through nih-plug. The block processor
//! only sees the [`ParameterSet`] trait, so it reads either one the same way.

use nih_plug::prelude::*;
use std::sync::atomic::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Threshold,
    Ratio,
    Attack,
    Release,
    Gain,
}

/// Range, skew and display metadata for a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f32,
    pub max: f32,
    /// nih-plug skew factor, `1.0` is linear.
    pub skew: f32,
    pub step: f32,
    pub default: f32,
}

impl ParamId {
    pub const ALL: [ParamId; 5] = [
        ParamId::Threshold,
        ParamId::Ratio,
        ParamId::Attack,
        ParamId::Release,
        ParamId::Gain,
    ];

    /// The stable identifier used for automation and saved state.
    pub const fn id(self) -> &'static str {
        match self {
            ParamId::Threshold => "threshold",
            ParamId::Ratio => "ratio",
            ParamId::Attack => "attack",
            ParamId::Release => "release",
            ParamId::Gain => "gain",
        }
    }

    /// Resolves an identifier. Matching ignores case so `"THRESHOLD"` works too.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|param| param.id().eq_ignore_ascii_case(id))
    }

    pub const fn spec(self) -> ParamSpec {
        let (name, unit, min, max, skew, step, default) = match self {
            ParamId::Threshold => ("Threshold", " dB", -24.0, 0.0, 1.0, 0.1, 0.0),
            ParamId::Ratio => ("Ratio", "", 1.0, 20.0, 0.5, 0.1, 1.0),
            ParamId::Attack => ("Attack", " ms", 0.1, 100.0, 0.3, 0.1, 0.1),
            ParamId::Release => ("Release", " ms", 10.0, 1000.0, 0.3, 1.0, 10.0),
            ParamId::Gain => ("Gain", " dB", 0.0, 24.0, 1.0, 0.1, 0.0),
        };

        ParamSpec {
            name,
            unit,
            min,
            max,
            skew,
            step,
            default,
        }
    }
}

impl ParamSpec {
    /// Clamps `value` into range. Non-finite input falls back to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.default
        }
    }

    pub fn range(&self) -> FloatRange {
        if self.skew == 1.0 {
            FloatRange::Linear {
                min: self.min,
                max: self.max,
            }
        } else {
            FloatRange::Skewed {
                min: self.min,
                max: self.max,
                factor: self.skew,
            }
        }
    }
}

/// All five values read at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub gain_db: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_fn(|id| id.spec().default)
    }
}

impl Settings {
    fn from_fn(f: impl Fn(ParamId) -> f32) -> Self {
        Self {
            threshold_db: f(ParamId::Threshold),
            ratio: f(ParamId::Ratio),
            attack_ms: f(ParamId::Attack),
            release_ms: f(ParamId::Release),
            gain_db: f(ParamId::Gain),
        }
    }

    /// Forces every field back into its documented range.
    pub fn clamped(self) -> Self {
        Self::from_fn(|id| id.spec().clamp(self.get(id)))
    }
}

/// Read access to the current parameter values.
///
/// Implementations must be safe to read from the audio thread: no locks, no allocations.
pub trait ParameterSet {
    fn get(&self, id: ParamId) -> f32;

    /// Reads every parameter once. The block processor calls this once per block.
    fn snapshot(&self) -> Settings {
        Settings::from_fn(|id| self.get(id))
    }
}

impl ParameterSet for Settings {
    fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::Threshold => self.threshold_db,
            ParamId::Ratio => self.ratio,
            ParamId::Attack => self.attack_ms,
            ParamId::Release => self.release_ms,
            ParamId::Gain => self.gain_db,
        }
    }

    fn snapshot(&self) -> Settings {
        *self
    }
}

/// Lock-free parameter storage, one atomic per parameter.
///
/// A control thread writes with [`set()`][Self::set()] while the audio thread reads. Writes are
/// relaxed, so a change may land one block early or late.
pub struct ParamSlots {
    slots: [AtomicF32; 5],
}

impl Default for ParamSlots {
    fn default() -> Self {
        Self {
            slots: ParamId::ALL.map(|id| AtomicF32::new(id.spec().default)),
        }
    }
}

impl ParamSlots {
    /// Stores `value` clamped to the parameter's range. Non-finite values are ignored.
    pub fn set(&self, id: ParamId, value: f32) {
        if value.is_finite() {
            self.slots[id as usize].store(id.spec().clamp(value), Ordering::Relaxed);
        }
    }

    /// Applies saved key/value pairs and returns how many were recognized.
    pub fn restore<'a>(&self, values: impl IntoIterator<Item = (&'a str, f32)>) -> usize {
        let mut applied = 0;
        for (key, value) in values {
            match ParamId::from_id(key) {
                Some(id) => {
                    self.set(id, value);
                    applied += 1;
                }
                None => nih_warn!("Ignoring unknown parameter '{key}' in saved state"),
            }
        }

        applied
    }
}

impl ParameterSet for ParamSlots {
    fn get(&self, id: ParamId) -> f32 {
        self.slots[id as usize].load(Ordering::Relaxed)
    }
}

#[derive(Params)]
pub struct SqueezeParams {
    /// Level above which the envelope starts following the signal.
    #[id = "threshold"]
    pub threshold: FloatParam,

    /// Divisor applied to the amount the signal exceeds the threshold.
    #[id = "ratio"]
    pub ratio: FloatParam,

    #[id = "attack"]
    pub attack: FloatParam,

    #[id = "release"]
    pub release: FloatParam,

    /// Makeup gain, applied to every sample after compression.
    #[id = "gain"]
    pub gain: FloatParam,
}

impl Default for SqueezeParams {
    fn default() -> Self {
        Self {
            threshold: float_param(ParamId::Threshold),
            ratio: float_param(ParamId::Ratio)
                .with_value_to_string(formatters::v2s_compression_ratio(1))
                .with_string_to_value(formatters::s2v_compression_ratio()),
            attack: float_param(ParamId::Attack),
            release: float_param(ParamId::Release),
            gain: float_param(ParamId::Gain),
        }
    }
}

impl SqueezeParams {
    pub fn param(&self, id: ParamId) -> &FloatParam {
        match id {
            ParamId::Threshold => &self.threshold,
            ParamId::Ratio => &self.ratio,
            ParamId::Attack => &self.attack,
            ParamId::Release => &self.release,
            ParamId::Gain => &self.gain,
        }
    }
}

impl ParameterSet for SqueezeParams {
    fn get(&self, id: ParamId) -> f32 {
        self.param(id).value()
    }
}

fn float_param(id: ParamId) -> FloatParam {
    let spec = id.spec();
    let param = FloatParam::new(spec.name, spec.default, spec.range()).with_step_size(spec.step);
    if spec.unit.is_empty() {
        param
    } else {
        param.with_unit(spec.unit)
    }
}
