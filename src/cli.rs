//! Command-line argument parsing.

use clap::Parser;

use crate::params::{CityConfig, SceneConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Neoncity")]
#[command(about = "Audio-reactive procedural skyline", long_about = None)]
pub struct Args {
    /// Number of ticks to run in headless mode
    #[arg(long, value_name = "TICKS", default_value = "600")]
    pub ticks: u64,

    /// Buildings per grid side
    #[arg(long, value_name = "N", default_value = "20")]
    pub grid_size: u32,

    /// City generation seed
    #[arg(long, value_name = "SEED", default_value = "42")]
    pub seed: u64,

    /// Orbit camera mode (disables infinite scroll)
    #[arg(long)]
    pub orbit: bool,

    /// Scroll speed (world units per tick)
    #[arg(long, value_name = "SPEED", default_value = "0.3")]
    pub scroll_speed: f64,

    /// Energy smoothing factor (0-1)
    #[arg(long, value_name = "FACTOR", default_value = "0.15")]
    pub smoothing: f64,

    /// Drive the session from its own thread at this frame rate instead of
    /// ticking synchronously
    #[arg(long, value_name = "FPS")]
    pub realtime: Option<u32>,
}

impl Args {
    /// City configuration from command-line arguments.
    pub fn city_config(&self) -> CityConfig {
        CityConfig {
            grid_size: self.grid_size,
            seed: self.seed,
            ..CityConfig::default()
        }
    }

    /// Scene configuration from command-line arguments.
    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            infinite_scroll: !self.orbit,
            scroll_speed: self.scroll_speed,
            smoothing_factor: self.smoothing,
            ..SceneConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_scene() {
        let args = Args::parse_from(["neoncity"]);
        let city = args.city_config();
        assert_eq!(city.grid_size, 20);
        assert_eq!(city.seed, 42);

        let scene = args.scene_config();
        assert!(scene.infinite_scroll);
        assert_eq!(scene.smoothing_factor, 0.15);
    }

    #[test]
    fn test_orbit_flag_switches_camera_mode() {
        let args = Args::parse_from(["neoncity", "--orbit", "--grid-size", "8"]);
        assert!(!args.scene_config().infinite_scroll);
        assert_eq!(args.city_config().grid_size, 8);
    }
}
