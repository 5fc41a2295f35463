//! Neoncity - an audio-reactive procedural skyline, headless.
//!
//! Synthesizes a test tone in memory, runs it through the spectrum
//! analyzer, and drives the animation session against a null renderer so
//! the whole pipeline can be exercised without a GPU or an audio device.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use neoncity::analyzer::SpectrumAnalyzer;
use neoncity::animator::{self, AnimationSession, DT};
use neoncity::audio::{AudioSource, SpectrumSample};
use neoncity::city;
use neoncity::cli::Args;
use neoncity::config::ConfigHandle;
use neoncity::params::{AnalyzerConfig, ConfigError, PostProcessConfig};
use neoncity::render::NullRenderer;

/// Audio source that synthesizes its own signal: a 2 Hz bass thump plus
/// steady mid and treble partials, pushed through the spectrum analyzer one
/// logical tick at a time.
struct ToneSource {
    analyzer: SpectrumAnalyzer,
    sample_rate: f64,
    sample_clock: f64,
    samples_per_tick: usize,
}

impl ToneSource {
    fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        let sample_rate = config.sample_rate_hz as f64;
        let mut analyzer = SpectrumAnalyzer::new(config)?;
        analyzer.set_playing(true);
        Ok(Self {
            analyzer,
            sample_rate,
            sample_clock: 0.0,
            samples_per_tick: (sample_rate * DT) as usize,
        })
    }
}

impl AudioSource for ToneSource {
    fn current_spectrum(&mut self) -> Option<SpectrumSample> {
        let mut chunk = Vec::with_capacity(self.samples_per_tick);
        for _ in 0..self.samples_per_tick {
            let t = self.sample_clock / self.sample_rate;
            let thump = (TAU * 2.0 * t).sin().max(0.0);
            let sample = 0.5 * thump * (TAU * 55.0 * t).sin()
                + 0.2 * (TAU * 880.0 * t).sin()
                + 0.1 * (TAU * 6000.0 * t).sin();
            chunk.push(sample);
            self.sample_clock += 1.0;
        }
        self.analyzer.push_samples(&chunk);
        self.analyzer.current_spectrum()
    }

    fn is_playing(&self) -> bool {
        self.analyzer.is_playing()
    }

    fn is_loaded(&self) -> bool {
        self.analyzer.is_loaded()
    }
}

fn main() -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    println!("Neoncity - audio-reactive procedural skyline");
    println!("Initializing systems...\n");

    let city = city::generate(&args.city_config())?;
    println!(
        "City: {} buildings ({} normal, {} cyan, {} magenta)",
        city.len(),
        city.normal.len(),
        city.cyan.len(),
        city.magenta.len()
    );

    let mut session = AnimationSession::new(city);
    let mut source = ToneSource::new(AnalyzerConfig::default())?;
    let configs = Arc::new(ConfigHandle::new(
        args.scene_config(),
        PostProcessConfig::default(),
    ));

    if let Some(fps) = args.realtime {
        let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        println!("Running threaded at {fps} fps for {} ticks...\n", args.ticks);

        let driver = animator::start(session, source, NullRenderer, configs, interval);
        std::thread::sleep(interval * args.ticks as u32);
        session = driver.stop();
    } else {
        println!("Running {} ticks...\n", args.ticks);
        let mut sink = NullRenderer;

        for tick_index in 0..args.ticks {
            let scene = configs.scene();
            let post = configs.post();
            let stats = session.tick(&mut source, &scene, &post, &mut sink);

            if tick_index % 100 == 0 {
                let e = stats.energies;
                println!(
                    "t={:>6.2}  bass={:.3} mid={:.3} treble={:.3} overall={:.3}",
                    stats.time, e.bass, e.mid, e.treble, e.overall
                );
            }
        }
    }

    let energies = session.smoothed();
    println!(
        "\nDone. t={:.2}, smoothed energies: bass={:.3} mid={:.3} treble={:.3} overall={:.3}",
        session.time(),
        energies.bass,
        energies.mid,
        energies.treble,
        energies.overall
    );

    Ok(())
}
