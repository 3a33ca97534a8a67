use nih_plug::prelude::Enum;
use std::f64::consts::TAU;

/// The eight filter shapes the EQ band can take. The order is load-bearing:
/// hosts persist the selection by index, so new variants go at the end.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Peak,
    #[name = "Low Pass"]
    LowPass,
    #[name = "High Pass"]
    HighPass,
    #[name = "Band Pass"]
    BandPass,
    Notch,
    #[name = "All Pass"]
    AllPass,
    #[name = "Low Shelf"]
    LowShelf,
    #[name = "High Shelf"]
    HighShelf,
}

impl FilterType {
    /// Whether the gain parameter participates in the coefficient formula.
    /// The other five shapes ignore it entirely.
    pub fn uses_gain(self) -> bool {
        matches!(self, Self::Peak | Self::LowShelf | Self::HighShelf)
    }
}

/// Normalized biquad coefficients (a0 == 1). Always replaced as a whole unit
/// so the processing path never sees a partially updated set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BiquadCoeffs {
    /// Passes the signal through unchanged. Used until the first recompute.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Computes coefficients from the user-facing parameters using the RBJ
    /// Audio EQ Cookbook design equations. The math runs in double precision
    /// and narrows at the end, which keeps low-frequency/high-Q settings from
    /// quantizing audibly.
    ///
    /// `gain_db` only affects `Peak`, `LowShelf` and `HighShelf`. A
    /// non-positive sample rate is a programming error; release builds return
    /// `None` so the caller can keep its last known good coefficients.
    pub fn compute(
        filter_type: FilterType,
        freq: f32,
        gain_db: f32,
        q: f32,
        sample_rate: f32,
    ) -> Option<Self> {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        if sample_rate <= 0.0 {
            return None;
        }

        let sr = f64::from(sample_rate);
        // The parameter range already tops out well below Nyquist at common
        // sample rates; this clamp is numeric safety only.
        let freq = f64::from(freq).min(sr * 0.499);
        let q = f64::from(q);

        let omega = TAU * freq / sr;
        let cos_w = omega.cos();
        let sin_w = omega.sin();
        let alpha = sin_w / (2.0 * q);
        // Shelf/peak amplitude, 10^(dB/40) per the cookbook
        let amp = 10f64.powf(f64::from(gain_db) / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            FilterType::Peak => (
                1.0 + alpha * amp,
                -2.0 * cos_w,
                1.0 - alpha * amp,
                1.0 + alpha / amp,
                -2.0 * cos_w,
                1.0 - alpha / amp,
            ),
            FilterType::LowPass => (
                (1.0 - cos_w) / 2.0,
                1.0 - cos_w,
                (1.0 - cos_w) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            FilterType::HighPass => (
                (1.0 + cos_w) / 2.0,
                -(1.0 + cos_w),
                (1.0 + cos_w) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            // Constant 0 dB peak variant
            FilterType::BandPass => (
                alpha,
                0.0,
                -alpha,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            FilterType::Notch => (
                1.0,
                -2.0 * cos_w,
                1.0,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            FilterType::AllPass => (
                1.0 - alpha,
                -2.0 * cos_w,
                1.0 + alpha,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            FilterType::LowShelf => {
                let shelf = 2.0 * amp.sqrt() * alpha;
                let ap1 = amp + 1.0;
                let am1 = amp - 1.0;
                (
                    amp * (ap1 - am1 * cos_w + shelf),
                    2.0 * amp * (am1 - ap1 * cos_w),
                    amp * (ap1 - am1 * cos_w - shelf),
                    ap1 + am1 * cos_w + shelf,
                    -2.0 * (am1 + ap1 * cos_w),
                    ap1 + am1 * cos_w - shelf,
                )
            }
            FilterType::HighShelf => {
                let shelf = 2.0 * amp.sqrt() * alpha;
                let ap1 = amp + 1.0;
                let am1 = amp - 1.0;
                (
                    amp * (ap1 + am1 * cos_w + shelf),
                    -2.0 * amp * (am1 + ap1 * cos_w),
                    amp * (ap1 + am1 * cos_w - shelf),
                    ap1 - am1 * cos_w + shelf,
                    2.0 * (am1 - ap1 * cos_w),
                    ap1 - am1 * cos_w - shelf,
                )
            }
        };

        Some(Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        })
    }

    /// Evaluates the transfer function on the unit circle at `freq` Hz and
    /// returns `(linear magnitude, phase in radians)`. Pure; safe to call
    /// from the GUI thread against its own coefficient snapshot.
    pub fn response_at(&self, freq: f64, sample_rate: f64) -> (f64, f64) {
        let w = TAU * freq / sample_rate;
        let cos_w = w.cos();
        let cos_2w = (2.0 * w).cos();
        let sin_w = w.sin();
        let sin_2w = (2.0 * w).sin();

        let (b0, b1, b2) = (f64::from(self.b0), f64::from(self.b1), f64::from(self.b2));
        let (a1, a2) = (f64::from(self.a1), f64::from(self.a2));

        // H(e^jw) = (b0 + b1 e^-jw + b2 e^-2jw) / (1 + a1 e^-jw + a2 e^-2jw)
        let num_re = b0 + b1 * cos_w + b2 * cos_2w;
        let num_im = -(b1 * sin_w + b2 * sin_2w);
        let den_re = 1.0 + a1 * cos_w + a2 * cos_2w;
        let den_im = -(a1 * sin_w + a2 * sin_2w);

        let den_norm = den_re * den_re + den_im * den_im;
        let re = (num_re * den_re + num_im * den_im) / den_norm;
        let im = (num_im * den_re - num_re * den_im) / den_norm;

        ((re * re + im * im).sqrt(), im.atan2(re))
    }

    /// Fills `mags` with linear magnitudes at each frequency in `freqs`.
    pub fn frequency_response(&self, freqs: &[f64], mags: &mut [f64], sample_rate: f64) {
        for (freq, mag) in freqs.iter().zip(mags.iter_mut()) {
            *mag = self.response_at(*freq, sample_rate).0;
        }
    }

    /// Fills `phases` with phase values in radians at each frequency in `freqs`.
    pub fn phase_response(&self, freqs: &[f64], phases: &mut [f64], sample_rate: f64) {
        for (freq, phase) in freqs.iter().zip(phases.iter_mut()) {
            *phase = self.response_at(*freq, sample_rate).1;
        }
    }
}

/// One channel's delay registers. Channels never share history, so the
/// engine keeps one of these per channel and runs them all against the same
/// shared coefficient set.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterState {
    z1: f32,
    z2: f32,
}

impl FilterState {
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    pub fn process_sample(&mut self, coeffs: &BiquadCoeffs, x: f32) -> f32 {
        // Direct Form II Transposed to keep numerical stability
        let y = coeffs.b0 * x + self.z1;
        self.z1 = coeffs.b1 * x - coeffs.a1 * y + self.z2;
        self.z2 = coeffs.b2 * x - coeffs.a2 * y;
        y
    }
}
