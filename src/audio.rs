//! Frequency banding and temporal smoothing of spectrum snapshots.
//!
//! A [`SpectrumSample`] arrives once per frame from whatever analyzer the
//! host wired in (see [`AudioSource`]); [`band_energies`] folds it into four
//! normalized band energies, and [`SmoothedEnergies`] low-pass filters those
//! across frames so visuals track the music instead of analysis noise.

/// Maximum representable bin magnitude (byte spectrum).
pub const MAX_MAGNITUDE: f64 = 255.0;

/// One frame's worth of per-bin spectrum magnitudes (0-255 each).
///
/// Immutable snapshot; nothing holds onto it past the frame that produced it.
#[derive(Debug, Clone)]
pub struct SpectrumSample {
    bins: Vec<u8>,
}

impl SpectrumSample {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Normalized band energies derived from one spectrum snapshot.
///
/// Each field lies in [0,1]. Recomputed every frame, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergies {
    pub bass: f64,
    pub mid: f64,
    pub treble: f64,
    pub overall: f64,
}

/// Fold a raw spectrum into band energies.
///
/// The spectrum is split by fixed fractions of its length: the low 10% of
/// bins is bass, up to 50% is mid, the rest is treble; `overall` averages
/// the whole range. Each band is the mean magnitude normalized to [0,1].
/// An empty range (short or empty spectrum) yields 0 for that band.
pub fn band_energies(spectrum: &SpectrumSample) -> BandEnergies {
    let bins = spectrum.bins();
    let n = bins.len();
    let bass_end = n / 10;
    let mid_end = n / 2;

    BandEnergies {
        bass: mean_normalized(&bins[..bass_end]),
        mid: mean_normalized(&bins[bass_end..mid_end]),
        treble: mean_normalized(&bins[mid_end..]),
        overall: mean_normalized(bins),
    }
}

fn mean_normalized(range: &[u8]) -> f64 {
    if range.is_empty() {
        return 0.0;
    }
    let sum: u64 = range.iter().map(|&m| m as u64).sum();
    sum as f64 / range.len() as f64 / MAX_MAGNITUDE
}

/// Exponential smoothing step: move `previous` toward `target` by `factor`.
///
/// `factor` 0 leaves the previous value untouched; 1 jumps straight to the
/// target. The caller is responsible for clamping the factor; see
/// [`SmoothedEnergies::apply`].
pub fn smooth(previous: f64, target: f64, factor: f64) -> f64 {
    previous + (target - previous) * factor
}

/// Band energies low-pass filtered across frames.
///
/// Session-lifetime state: one instance per animation session, mutated in
/// place each tick. Since each field is a lerp of two [0,1] values with a
/// [0,1] factor, every field stays in [0,1].
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothedEnergies {
    pub bass: f64,
    pub mid: f64,
    pub treble: f64,
    pub overall: f64,
}

impl SmoothedEnergies {
    /// Pull all four bands toward `raw` with one shared factor.
    ///
    /// An out-of-range factor is clamped to [0,1] rather than rejected;
    /// the factor actually used is returned so the caller can surface a
    /// diagnostic without ever stopping the loop.
    pub fn apply(&mut self, raw: BandEnergies, factor: f64) -> f64 {
        let factor = factor.clamp(0.0, 1.0);
        self.bass = smooth(self.bass, raw.bass, factor);
        self.mid = smooth(self.mid, raw.mid, factor);
        self.treble = smooth(self.treble, raw.treble, factor);
        self.overall = smooth(self.overall, raw.overall, factor);
        factor
    }
}

/// Boundary to the external audio side: playback state plus a per-frame
/// spectrum snapshot. `None` means nothing to analyze yet (no track, decode
/// pending, paused) and is not an error.
pub trait AudioSource {
    /// Latest spectrum snapshot, if one is available.
    fn current_spectrum(&mut self) -> Option<SpectrumSample>;

    /// Whether playback is currently running.
    fn is_playing(&self) -> bool;

    /// Whether a track has been loaded at all.
    fn is_loaded(&self) -> bool;
}

/// Audio source that never produces a spectrum. The scene still animates on
/// its residual time-based motion.
#[derive(Debug, Default)]
pub struct SilentSource;

impl AudioSource for SilentSource {
    fn current_spectrum(&mut self) -> Option<SpectrumSample> {
        None
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn is_loaded(&self) -> bool {
        false
    }
}
