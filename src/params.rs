use nih_plug::prelude::*;
use nih_plug_iced::IcedState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::biquad::FilterType;
use crate::editor;

/// The single EQ band's parameters. The ids double as the keys in the
/// host-persisted state, so they stay fixed even if display names change.
#[derive(Params)]
pub struct PhaseEqParams {
    /// The editor state, saved together with the parameter state so the
    /// window size can be restored.
    #[persist = "editor-state"]
    pub editor_state: Arc<IcedState>,

    #[id = "FREQ"]
    pub freq: FloatParam,

    #[id = "GAIN"]
    pub gain: FloatParam,

    #[id = "Q"]
    pub q: FloatParam,

    #[id = "FILTERS"]
    pub filter_type: EnumParam<FilterType>,
}

impl PhaseEqParams {
    /// Every value change raises `should_update_filter` so the audio thread
    /// recomputes its coefficients at the start of the next block. Setting a
    /// parameter does nothing else; the filter math lives elsewhere.
    pub fn new(should_update_filter: Arc<AtomicBool>) -> Self {
        let update_on_float = |flag: Arc<AtomicBool>| -> Arc<dyn Fn(f32) + Send + Sync> {
            Arc::new(move |_| flag.store(true, Ordering::Release))
        };

        let update_on_type = {
            let flag = should_update_filter.clone();
            Arc::new(move |_: FilterType| flag.store(true, Ordering::Release))
        };

        Self {
            editor_state: editor::default_state(),

            freq: FloatParam::new(
                "Frequency",
                1000.0,
                // Most of the slider travel goes to the low end, like an
                // analog frequency dial
                FloatRange::Skewed {
                    min: 30.0,
                    max: 20_000.0,
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" Hz")
            .with_value_to_string(formatters::v2s_f32_rounded(1))
            .with_callback(update_on_float(should_update_filter.clone())),

            gain: FloatParam::new(
                "Gain",
                0.0,
                FloatRange::Linear {
                    min: -10.0,
                    max: 10.0,
                },
            )
            .with_unit(" dB")
            .with_value_to_string(formatters::v2s_f32_rounded(2))
            .with_callback(update_on_float(should_update_filter.clone())),

            q: FloatParam::new(
                "Q",
                0.707,
                FloatRange::Linear {
                    min: 0.1,
                    max: 18.0,
                },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(3))
            .with_callback(update_on_float(should_update_filter)),

            filter_type: EnumParam::new("Filter Type", FilterType::Peak)
                .with_callback(update_on_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biquad::BiquadCoeffs;

    fn make_params() -> PhaseEqParams {
        PhaseEqParams::new(Arc::new(AtomicBool::new(false)))
    }

    /// Value -> display string -> value, the way a host's generic UI or a
    /// typed-in value travels.
    fn through_formatter(param: &FloatParam, plain: f32) -> f32 {
        let formatted = param.normalized_value_to_string(param.preview_normalized(plain), true);
        let normalized = param
            .string_to_normalized_value(&formatted)
            .expect("formatted value should parse back");
        param.preview_plain(normalized)
    }

    #[test]
    fn formatter_round_trip_preserves_displayed_values() {
        let params = make_params();

        // Tolerances follow each formatter's rounding precision
        let freq = through_formatter(&params.freq, 2500.0);
        assert!((freq - 2500.0).abs() < 0.1, "freq: {freq}");

        let gain = through_formatter(&params.gain, -3.25);
        assert!((gain + 3.25).abs() < 0.01, "gain: {gain}");

        let q = through_formatter(&params.q, 0.707);
        assert!((q - 0.707).abs() < 0.001, "q: {q}");
    }

    #[test]
    fn persisted_state_round_trip_reproduces_coefficients() {
        // The wrapper persists each parameter's plain value under its stable
        // id, and the filter type by its variant index. f32 `Display` output
        // parses back bit-exactly, so a save/restore cycle hands the same
        // four values to the forced recompute that follows a restore.
        let saved_freq = 2500.0f32;
        let saved_gain = -3.25f32;
        let saved_q = 1.414f32;
        let saved_type = FilterType::Notch;

        let blob = format!(
            "FREQ={saved_freq}\nGAIN={saved_gain}\nQ={saved_q}\nFILTERS={}\n",
            saved_type.to_index()
        );

        let mut freq = None;
        let mut gain = None;
        let mut q = None;
        let mut filter_type = None;
        for line in blob.lines() {
            let (key, value) = line.split_once('=').unwrap();
            match key {
                "FREQ" => freq = Some(value.parse::<f32>().unwrap()),
                "GAIN" => gain = Some(value.parse::<f32>().unwrap()),
                "Q" => q = Some(value.parse::<f32>().unwrap()),
                "FILTERS" => {
                    filter_type = Some(FilterType::from_index(value.parse::<usize>().unwrap()))
                }
                _ => unreachable!("unknown key {key}"),
            }
        }
        let freq = freq.unwrap();
        let gain = gain.unwrap();
        let q = q.unwrap();
        let filter_type = filter_type.unwrap();

        assert_eq!(freq.to_bits(), saved_freq.to_bits());
        assert_eq!(gain.to_bits(), saved_gain.to_bits());
        assert_eq!(q.to_bits(), saved_q.to_bits());
        assert_eq!(filter_type, saved_type);

        let before =
            BiquadCoeffs::compute(saved_type, saved_freq, saved_gain, saved_q, 48000.0).unwrap();
        let after = BiquadCoeffs::compute(filter_type, freq, gain, q, 48000.0).unwrap();

        let bits = |c: &BiquadCoeffs| {
            [
                c.b0.to_bits(),
                c.b1.to_bits(),
                c.b2.to_bits(),
                c.a1.to_bits(),
                c.a2.to_bits(),
            ]
        };
        assert_eq!(bits(&before), bits(&after));
    }
}
