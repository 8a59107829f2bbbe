use nih_plug::prelude::*;

use crate::coefficients::BlockCoefficients;
use crate::envelope::EnvelopeFollower;
use crate::params::ParameterSet;
use crate::scope::{Scope, ScopeHandle};

/// What the host told us about the stream in `prepare()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorConfig {
    pub sample_rate: f32,
    /// The scope frames are sized to this many samples.
    pub max_block_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            max_block_size: 0,
        }
    }
}

/// The block processor. It takes one parameter snapshot per block and runs every channel through a
/// single shared envelope, publishing the first channel before and after processing.
pub struct Compressor {
    config: ProcessorConfig,
    follower: EnvelopeFollower,
    scope: Scope,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

impl Compressor {
    pub fn new(config: ProcessorConfig) -> Self {
        let (scope, _) = Scope::new(config.max_block_size);
        Self {
            config,
            follower: EnvelopeFollower::new(),
            scope,
        }
    }

    pub fn config(&self) -> ProcessorConfig {
        self.config
    }

    pub fn envelope(&self) -> f32 {
        self.follower.envelope()
    }

    /// Handle for the display layer. Stays valid across later calls to [`prepare()`][Self::prepare()].
    pub fn scope(&self) -> ScopeHandle {
        self.scope.handle()
    }

    /// Applies a new stream configuration, resizing the scope frames if the block size changed.
    /// Always resets.
    ///
    /// May allocate. Not for the audio thread.
    pub fn prepare(&mut self, config: ProcessorConfig) {
        self.config = config;
        self.scope.resize(config.max_block_size);
        self.reset();
    }

    /// Zeroes the envelope and both scope frames. Does not allocate.
    pub fn reset(&mut self) {
        self.follower.reset();
        self.scope.clear();
    }

    /// Compresses `channels` in place.
    ///
    /// Parameters are read once at the start, so automation only takes effect at block boundaries.
    /// The envelope carries over from each channel to the next and from one block to the next.
    pub fn process<P: ParameterSet + ?Sized>(&mut self, channels: &mut [&mut [f32]], params: &P) {
        let num_samples = match channels.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return,
        };
        nih_debug_assert!(channels.iter().all(|channel| channel.len() == num_samples));

        let settings = params.snapshot().clamped();
        let coeffs = BlockCoefficients::new(&settings, self.config.sample_rate);

        self.scope.write_input(&channels[0]);

        for channel in channels.iter_mut() {
            self.follower.process(channel, &coeffs);
        }

        self.scope.write_output(&channels[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamId, ParamSlots, Settings};

    const SAMPLE_RATE: f32 = 48000.0;

    fn prepared(block_size: usize) -> (Compressor, ScopeHandle) {
        let mut compressor = Compressor::default();
        compressor.prepare(ProcessorConfig {
            sample_rate: SAMPLE_RATE,
            max_block_size: block_size,
        });
        let scope = compressor.scope();
        (compressor, scope)
    }

    fn compressing() -> Settings {
        Settings {
            threshold_db: -6.0,
            ratio: 4.0,
            attack_ms: 0.1,
            release_ms: 10.0,
            gain_db: 0.0,
        }
    }

    #[test]
    fn test_gain_with_pass_through_settings() {
        let (mut compressor, _) = prepared(4);
        let params = ParamSlots::default();
        params.set(ParamId::Gain, 6.0);

        let mut left = vec![0.5_f32; 4];
        let mut right = vec![-0.5_f32; 4];
        compressor.process(&mut [&mut left[..], &mut right[..]], &params);

        for sample in left {
            assert!((sample - 0.997_631).abs() < 1e-5);
        }
        for sample in right {
            assert!((sample + 0.997_631).abs() < 1e-5);
        }
        assert_eq!(compressor.envelope(), 0.0);
    }

    #[test]
    fn test_silence_leaves_state_untouched() {
        let (mut compressor, scope) = prepared(64);
        let mut left = vec![0.0_f32; 64];
        let mut right = vec![0.0_f32; 64];
        compressor.process(&mut [&mut left[..], &mut right[..]], &compressing());

        assert_eq!(compressor.envelope(), 0.0);
        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
        assert_eq!(scope.output_buffer(), vec![0.0; 64]);
        assert_eq!(scope.input_buffer(), vec![0.0; 64]);
    }

    #[test]
    fn test_scope_holds_first_channel_before_and_after() {
        let (mut compressor, scope) = prepared(8);
        let mut left = vec![1.0_f32; 8];
        let mut right = vec![0.1_f32; 8];
        compressor.process(&mut [&mut left[..], &mut right[..]], &compressing());

        assert_eq!(scope.input_buffer(), vec![1.0; 8]);
        assert_eq!(scope.output_buffer(), left);
        assert!(left.iter().all(|&s| s < 1.0));
    }

    #[test]
    fn test_envelope_is_shared_across_channels_and_blocks() {
        let (mut compressor, _) = prepared(16);
        let settings = compressing();

        let mut left = vec![1.0_f32; 16];
        let mut right = vec![1.0_f32; 16];
        compressor.process(&mut [&mut left[..], &mut right[..]], &settings);

        // The right channel continues where the left one left off
        let mut follower = EnvelopeFollower::new();
        let coeffs = BlockCoefficients::new(&settings, SAMPLE_RATE);
        let mut expected = vec![1.0_f32; 32];
        follower.process(&mut expected, &coeffs);
        assert_eq!(left, expected[..16]);
        assert_eq!(right, expected[16..]);
        assert_eq!(compressor.envelope(), follower.envelope());

        let mut next = vec![1.0_f32; 16];
        compressor.process(&mut [&mut next[..]], &settings);
        let mut expected = vec![1.0_f32; 16];
        follower.process(&mut expected, &coeffs);
        assert_eq!(next, expected);
    }

    #[test]
    fn test_parameter_changes_apply_per_block() {
        let (mut compressor, _) = prepared(4);
        let params = ParamSlots::default();
        params.restore([("threshold", -6.0), ("ratio", 4.0)]);

        let mut block = vec![0.25_f32; 4];
        compressor.process(&mut [&mut block[..]], &params);
        assert_eq!(block, vec![0.25; 4]);

        params.set(ParamId::Gain, 6.0);
        let mut block = vec![0.25_f32; 4];
        compressor.process(&mut [&mut block[..]], &params);
        assert!(block.iter().all(|&s| (s - 0.25 * 1.995_262).abs() < 1e-5));
    }

    #[test]
    fn test_empty_block_is_noop() {
        let (mut compressor, scope) = prepared(4);
        let mut warm = vec![1.0_f32; 4];
        compressor.process(&mut [&mut warm[..]], &compressing());
        let envelope = compressor.envelope();
        let published = scope.output_buffer();

        let mut empty: Vec<f32> = Vec::new();
        compressor.process(&mut [&mut empty[..]], &compressing());
        let mut no_channels: [&mut [f32]; 0] = [];
        compressor.process(&mut no_channels, &compressing());

        assert_eq!(compressor.envelope(), envelope);
        assert_eq!(scope.output_buffer(), published);
    }

    #[test]
    fn test_prepare_resizes_and_resets() {
        let (mut compressor, scope) = prepared(32);
        let mut block = vec![1.0_f32; 32];
        compressor.process(&mut [&mut block[..]], &compressing());
        assert!(compressor.envelope() > 0.0);

        compressor.prepare(ProcessorConfig {
            sample_rate: 96000.0,
            max_block_size: 128,
        });
        assert_eq!(compressor.envelope(), 0.0);
        assert_eq!(scope.len(), 128);
        assert_eq!(scope.input_buffer(), vec![0.0; 128]);

        compressor.prepare(ProcessorConfig {
            sample_rate: 96000.0,
            max_block_size: 16,
        });
        assert_eq!(scope.len(), 16);
        assert_eq!(compressor.config().sample_rate, 96000.0);
    }

    #[test]
    fn test_output_stays_finite() {
        let (mut compressor, _) = prepared(6);
        let params = ParamSlots::default();
        params.set(ParamId::Threshold, -24.0);
        params.set(ParamId::Ratio, 20.0);
        params.set(ParamId::Attack, 0.1);
        params.set(ParamId::Gain, 24.0);

        let mut block = vec![8.0_f32, -8.0, 1e6, -1e6, 0.0, 1.0];
        compressor.process(&mut [&mut block[..]], &params);
        assert!(block.iter().all(|s| s.is_finite()));

        // Out of range snapshots are clamped before use
        let wild = Settings {
            threshold_db: 1000.0,
            ratio: 0.0,
            attack_ms: -1.0,
            release_ms: 0.0,
            gain_db: f32::INFINITY,
        };
        let mut block = vec![0.5_f32, -2.0, 3.0];
        compressor.process(&mut [&mut block[..]], &wild);
        assert!(block.iter().all(|s| s.is_finite()));
    }
}
