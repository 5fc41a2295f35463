//! Parameter definitions with documented ranges and semantics.
//!
//! Every tunable the animation pipeline reads lives here, with:
//! - Documented ranges and meanings
//! - `Default` impls carrying the reference values
//! - Validation for the configurations that can be degenerate

use thiserror::Error;

/// Configuration errors raised at generation/construction time.
///
/// These are the only synchronous failures in the crate; everything else
/// degrades (clamps or zeroes) instead of erroring.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid size must be at least 1")]
    InvalidGridSize,

    #[error("height range invalid: max {max} is below min {min}")]
    InvalidHeightRange { min: f64, max: f64 },

    #[error("FFT size must be a power of two, got {0}")]
    InvalidFftSize(usize),

    #[error("sample rate must be > 0")]
    InvalidSampleRate,
}

/// City layout generation parameters.
#[derive(Debug, Clone)]
pub struct CityConfig {
    /// Buildings per side (grid is `grid_size x grid_size`)
    pub grid_size: u32,

    /// Distance between grid cells (world units)
    pub spacing: f64,

    /// Minimum building height (world units)
    pub min_height: f64,

    /// Maximum building height (world units)
    pub max_height: f64,

    /// Positional jitter as a fraction of spacing (0-1)
    pub building_variation: f64,

    /// Probability that a building gets the neon accent treatment (0-1)
    pub special_ratio: f64,

    /// RNG seed; same seed + config regenerates the identical city
    pub seed: u64,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            spacing: 4.0,
            min_height: 3.0,
            max_height: 30.0,
            building_variation: 0.3,
            special_ratio: 0.25,
            seed: 42,
        }
    }
}

impl CityConfig {
    /// Reject degenerate layouts before any entity is produced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::InvalidGridSize);
        }
        if self.max_height < self.min_height {
            return Err(ConfigError::InvalidHeightRange {
                min: self.min_height,
                max: self.max_height,
            });
        }
        Ok(())
    }
}

/// Live-tunable scene behavior, read fresh every tick.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Conveyor mode: buildings scroll toward the camera and wrap around
    pub infinite_scroll: bool,

    /// Forward distance added to each building per tick (world units)
    pub scroll_speed: f64,

    /// Energy smoothing factor (0-1); low = heavy smoothing, 1 = no smoothing
    pub smoothing_factor: f64,

    /// Z beyond which a scrolled building teleports back (world units)
    pub distance_threshold: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            infinite_scroll: true,
            scroll_speed: 0.3,
            smoothing_factor: 0.15,
            distance_threshold: 40.0,
        }
    }
}

/// Live-tunable post-processing and emissive parameters.
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// Base bloom strength before audio modulation
    pub bloom_strength: f64,

    /// Bloom luminance threshold (forwarded untouched)
    pub bloom_threshold: f64,

    /// Bloom radius (forwarded untouched)
    pub bloom_radius: f64,

    /// Base emissive intensity for accent buildings before audio modulation
    pub emissive_intensity: f64,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            bloom_strength: 1.8,
            bloom_threshold: 0.6,
            bloom_radius: 0.5,
            emissive_intensity: 1.0,
        }
    }
}

/// Circular orbit camera (used while infinite scroll is off).
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Orbit radius (world units)
    pub radius: f64,

    /// Angular speed (radians per logical second)
    pub angular_speed: f64,

    /// Base camera height (world units)
    pub height: f64,

    /// Vertical bob frequency (per logical second)
    pub bob_frequency: f64,

    /// Vertical bob amplitude (world units)
    pub bob_amplitude: f64,

    /// Look-at target
    pub target: [f64; 3],
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            radius: 60.0,
            angular_speed: 0.05,
            height: 25.0,
            bob_frequency: 0.3,
            bob_amplitude: 5.0,
            target: [0.0, 10.0, 0.0],
        }
    }
}

/// Lateral-sway camera (used while infinite scroll is on).
#[derive(Debug, Clone)]
pub struct ScrollCamera {
    /// Side-to-side sway amplitude (world units)
    pub sway_amplitude: f64,

    /// Sway frequency (per logical second)
    pub sway_frequency: f64,

    /// Fixed camera height (world units)
    pub height: f64,

    /// Fixed camera depth (world units)
    pub depth: f64,

    /// Look-at target (down the scroll axis)
    pub target: [f64; 3],
}

impl Default for ScrollCamera {
    fn default() -> Self {
        Self {
            sway_amplitude: 2.0,
            sway_frequency: 0.2,
            height: 15.0,
            depth: 5.0,
            target: [0.0, 10.0, -50.0],
        }
    }
}

/// Both camera presets; which one is active follows the scroll toggle.
#[derive(Debug, Clone, Default)]
pub struct CameraParams {
    pub orbit: OrbitCamera,
    pub scroll: ScrollCamera,
}

/// Spectrum analyzer configuration.
///
/// Mirrors a byte-frequency analyser node: magnitudes are time-smoothed per
/// bin, converted to dB and mapped onto 0-255.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be a power of 2); spectrum has `fft_size / 2` bins
    pub fft_size: usize,

    /// Per-bin magnitude smoothing (0-1); higher = smoother
    pub time_constant: f64,

    /// dB level mapped to byte 0
    pub min_db: f64,

    /// dB level mapped to byte 255
    pub max_db: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 2048,
            time_constant: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() {
            return Err(ConfigError::InvalidFftSize(self.fft_size));
        }
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        Ok(())
    }

    /// Number of spectrum bins produced per analysis frame.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_config_validation() {
        assert!(CityConfig::default().validate().is_ok());

        let zero_grid = CityConfig {
            grid_size: 0,
            ..CityConfig::default()
        };
        assert!(matches!(
            zero_grid.validate(),
            Err(ConfigError::InvalidGridSize)
        ));

        let bad_heights = CityConfig {
            min_height: 30.0,
            max_height: 3.0,
            ..CityConfig::default()
        };
        assert!(matches!(
            bad_heights.validate(),
            Err(ConfigError::InvalidHeightRange { .. })
        ));
    }

    #[test]
    fn test_analyzer_config_validation() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        assert_eq!(AnalyzerConfig::default().bin_count(), 1024);

        let odd_fft = AnalyzerConfig {
            fft_size: 1000,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            odd_fft.validate(),
            Err(ConfigError::InvalidFftSize(1000))
        ));
    }
}
