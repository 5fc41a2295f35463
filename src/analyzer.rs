//! PCM-to-spectrum adapter backed by rustfft.
//!
//! The core only consumes byte spectra through [`AudioSource`]; this
//! analyzer is the in-process way to produce them from raw samples the host
//! pushes in. It Hann-windows the most recent FFT frame, time-smooths the
//! per-bin magnitudes, and maps them through a dB range onto 0-255, so a
//! byte-frequency spectrum comes out the other side.

use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use tracing::warn;

use crate::audio::{AudioSource, SpectrumSample};
use crate::params::{AnalyzerConfig, ConfigError};

/// Streaming spectrum analyzer.
///
/// Feed samples with [`push_samples`](Self::push_samples); read byte spectra
/// through the [`AudioSource`] impl. Produces `fft_size / 2` bins per frame
/// once a full window has been buffered.
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    samples: VecDeque<f64>,
    /// Per-bin magnitudes after time-constant smoothing.
    smoothed: Vec<f64>,
    playing: bool,
    loaded: bool,
}

impl SpectrumAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut config = config;
        if !(0.0..=1.0).contains(&config.time_constant) {
            warn!(
                time_constant = config.time_constant,
                "time constant outside [0,1], clamping"
            );
            config.time_constant = config.time_constant.clamp(0.0, 1.0);
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| hann_window(i, config.fft_size))
            .collect();
        let smoothed = vec![0.0; config.bin_count()];

        Ok(Self {
            config,
            fft,
            window,
            samples: VecDeque::new(),
            smoothed,
            playing: false,
            loaded: false,
        })
    }

    /// Append mono samples. Only the most recent FFT window is retained.
    pub fn push_samples(&mut self, samples: &[f64]) {
        if !samples.is_empty() {
            self.loaded = true;
        }
        self.samples.extend(samples.iter().copied());
        while self.samples.len() > self.config.fft_size {
            self.samples.pop_front();
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn analyze(&mut self) -> SpectrumSample {
        let n = self.config.fft_size;
        let mut buffer: Vec<Complex<f64>> = self
            .samples
            .iter()
            .zip(&self.window)
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        let tc = self.config.time_constant;
        let db_span = self.config.max_db - self.config.min_db;

        let bins = (0..self.config.bin_count())
            .map(|i| {
                let magnitude = buffer[i].norm() / n as f64;
                self.smoothed[i] = tc * self.smoothed[i] + (1.0 - tc) * magnitude;

                let db = 20.0 * self.smoothed[i].max(f64::MIN_POSITIVE).log10();
                let unit = ((db - self.config.min_db) / db_span).clamp(0.0, 1.0);
                (unit * 255.0).round() as u8
            })
            .collect();

        SpectrumSample::new(bins)
    }
}

impl AudioSource for SpectrumAnalyzer {
    fn current_spectrum(&mut self) -> Option<SpectrumSample> {
        if !self.playing || self.samples.len() < self.config.fft_size {
            return None;
        }
        Some(self.analyze())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Hann window coefficient.
fn hann_window(index: usize, size: usize) -> f64 {
    use std::f64::consts::PI;
    0.5 * (1.0 - ((2.0 * PI * index as f64) / (size as f64 - 1.0)).cos())
}
