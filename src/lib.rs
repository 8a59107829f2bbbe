use nih_plug::prelude::*;
use std::sync::Arc;

pub mod coefficients;
pub use coefficients::{attack_coefficient, db_to_linear, release_coefficient, BlockCoefficients};
pub mod envelope;
pub use envelope::EnvelopeFollower;
pub mod params;
pub use params::{ParamId, ParamSlots, ParameterSet, Settings, SqueezeParams};
pub mod processor;
pub use processor::{Compressor, ProcessorConfig};
pub mod scope;
pub use scope::ScopeHandle;

pub struct Squeeze {
    params: Arc<SqueezeParams>,
    compressor: Compressor,
}

impl Default for Squeeze {
    fn default() -> Self {
        Self {
            params: Arc::new(SqueezeParams::default()),
            compressor: Compressor::default(),
        }
    }
}

impl Squeeze {
    /// Input and output snapshots of the most recent block, for a display to poll.
    pub fn scope(&self) -> ScopeHandle {
        self.compressor.scope()
    }
}

impl Plugin for Squeeze {
    const NAME: &'static str = "Squeeze";
    const VENDOR: &'static str = "Daishi Suzuki";
    const URL: &'static str = env!("CARGO_PKG_HOMEPAGE");
    const EMAIL: &'static str = "zukky.rikugame@gmail.com";

    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo is the default. Anything other than matching mono or stereo buses is refused during
    // layout negotiation, so `process()` never sees it.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),

            aux_input_ports: &[],
            aux_output_ports: &[],

            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const MIDI_OUTPUT: MidiConfig = MidiConfig::None;

    // Parameters are sampled once per block
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    // If the plugin can send or receive SysEx messages, it can define a type to wrap around those
    // messages here. The type implements the `SysExMessage` trait, which allows conversion to and
    // from plain byte buffers.
    type SysExMessage = ();
    // More advanced plugins can use this to run expensive background tasks. See the field's
    // documentation for more information. `()` means that the plugin does not have any background
    // tasks.
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        // Resize buffers and perform other potentially expensive initialization operations here.
        // The `reset()` function is always called right after this function.
        let sample_rate = buffer_config.sample_rate;
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            nih_error!("Refusing to initialize at a sample rate of {sample_rate} Hz");
            return false;
        }
        if buffer_config.max_buffer_size == 0 {
            nih_error!("Refusing to initialize with a maximum block size of zero");
            return false;
        }

        let config = ProcessorConfig {
            sample_rate,
            max_block_size: buffer_config.max_buffer_size as usize,
        };
        self.compressor.prepare(config);
        nih_log!(
            "Prepared for {} Hz with blocks of up to {} samples",
            config.sample_rate,
            config.max_block_size
        );

        true
    }

    fn reset(&mut self) {
        // Reset buffers and envelopes here. This can be called from the audio thread and may not
        // allocate.
        self.compressor.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        if buffer.samples() == 0 {
            return ProcessStatus::Normal;
        }

        self.compressor.process(buffer.as_slice(), self.params.as_ref());

        ProcessStatus::Normal
    }
}

impl ClapPlugin for Squeeze {
    const CLAP_ID: &'static str = "com.zukky.squeeze";
    const CLAP_DESCRIPTION: Option<&'static str> = Some("Single band envelope follower compressor");
    const CLAP_MANUAL_URL: Option<&'static str> = Some(Self::URL);
    const CLAP_SUPPORT_URL: Option<&'static str> = None;

    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Compressor,
    ];
}

impl Vst3Plugin for Squeeze {
    const VST3_CLASS_ID: [u8; 16] = *b"SqueezeCompress!";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Dynamics];
}

nih_export_clap!(Squeeze);
nih_export_vst3!(Squeeze);
