use atomic_float::AtomicF32;
use nih_plug::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod biquad;
mod editor;
mod params;

pub use biquad::{BiquadCoeffs, FilterState, FilterType};
pub use params::PhaseEqParams;

/// A single-band parametric EQ. One biquad section, eight selectable shapes,
/// and an editor that plots the magnitude and phase response.
pub struct PhaseEq {
    params: Arc<PhaseEqParams>,

    sample_rate: f32,
    /// The editor's response plot needs the real sample rate. Shared as an
    /// [`Arc`] the same way the GUI and audio halves share everything else.
    shared_sample_rate: Arc<AtomicF32>,

    /// UI -> audio: a parameter changed, coefficients are stale. Raised by
    /// the parameter callbacks, cleared only by `process()`.
    should_update_filter: Arc<AtomicBool>,
    /// Audio -> UI: coefficients were replaced, the plot should redraw.
    /// Raised by `process()`, cleared only by the editor.
    response_changed: Arc<AtomicBool>,

    /// Current coefficient set, shared by all channels and always replaced
    /// as a whole unit.
    coeffs: BiquadCoeffs,
    /// One pair of delay registers per channel.
    states: Vec<FilterState>,
}

impl Default for PhaseEq {
    fn default() -> Self {
        // Starts raised so the first block after instantiation or a state
        // restore always computes real coefficients.
        let should_update_filter = Arc::new(AtomicBool::new(true));

        Self {
            params: Arc::new(PhaseEqParams::new(should_update_filter.clone())),

            sample_rate: 44100.0,
            shared_sample_rate: Arc::new(AtomicF32::new(44100.0)),

            should_update_filter,
            response_changed: Arc::new(AtomicBool::new(false)),

            coeffs: BiquadCoeffs::IDENTITY,
            states: Vec::new(),
        }
    }
}

impl PhaseEq {
    /// Recomputes the coefficient set from the current parameter values. On
    /// a contract violation this keeps the last known good set.
    fn update_filter(&mut self) {
        if let Some(coeffs) = BiquadCoeffs::compute(
            self.params.filter_type.value(),
            self.params.freq.value(),
            self.params.gain.value(),
            self.params.q.value(),
            self.sample_rate,
        ) {
            self.coeffs = coeffs;
        }
    }
}

impl Plugin for PhaseEq {
    const NAME: &'static str = "Phase EQ";
    const VENDOR: &'static str = "phase_eq contributors";
    const URL: &'static str = "https://github.com/phase-eq/phase_eq";
    const EMAIL: &'static str = "info@example.com";

    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn editor(&mut self, _async_executor: AsyncExecutor<Self>) -> Option<Box<dyn Editor>> {
        editor::create(
            self.params.clone(),
            self.shared_sample_rate.clone(),
            self.response_changed.clone(),
            self.params.editor_state.clone(),
        )
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.sample_rate = buffer_config.sample_rate;
        self.shared_sample_rate
            .store(buffer_config.sample_rate, Ordering::Relaxed);

        // Fresh delay registers for the negotiated channel count
        let channels = audio_io_layout
            .main_input_channels
            .map_or(2, |n| n.get() as usize);
        self.states.clear();
        self.states.resize(channels, FilterState::default());

        // Unconditional recompute: covers the first prepare, sample rate
        // changes, and restored parameter state alike
        self.should_update_filter.store(true, Ordering::Release);

        true
    }

    fn reset(&mut self) {
        for state in &mut self.states {
            state.reset();
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // At most one recompute per block, before any sample is filtered, so
        // a coefficient change never lands mid-block
        if self.should_update_filter.swap(false, Ordering::AcqRel) {
            self.update_filter();

            if self.params.editor_state.is_open() {
                self.response_changed.store(true, Ordering::Release);
            }
        }

        for (channel, samples) in buffer.as_slice().iter_mut().enumerate() {
            let Some(state) = self.states.get_mut(channel) else {
                break;
            };

            for sample in samples.iter_mut() {
                *sample = state.process_sample(&self.coeffs, *sample);
            }
        }

        ProcessStatus::Normal
    }
}

impl ClapPlugin for PhaseEq {
    const CLAP_ID: &'static str = "com.phase-eq.phase-eq";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A single-band parametric EQ with response plotting");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Equalizer,
    ];
}

impl Vst3Plugin for PhaseEq {
    const VST3_CLASS_ID: [u8; 16] = *b"PhaseEqSingleBnd";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Eq];
}

nih_export_clap!(PhaseEq);
nih_export_vst3!(PhaseEq);
