//! The reactive animation loop.
//!
//! [`AnimationSession`] owns everything that persists across frames: the
//! building population, the smoothed energies, and the logical clock. One
//! [`tick`](AnimationSession::tick) runs the whole per-frame algorithm —
//! band, smooth, scroll, scale, emit — synchronously, so it can be driven
//! by a real-time loop, the bundled thread driver, or a deterministic test
//! harness.
//!
//! Time is logical: the clock advances by a fixed [`DT`] per tick regardless
//! of wall-clock frame duration, so motion is deterministic under variable
//! frame rate (and does not track real elapsed audio time).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use glam::DVec3;
use tracing::{debug, warn};

use crate::audio::{band_energies, AudioSource, BandEnergies, SmoothedEnergies};
use crate::camera;
use crate::city::{AccentColor, BuildingEntity, City};
use crate::config::ConfigHandle;
use crate::params::{CameraParams, PostProcessConfig, SceneConfig};
use crate::render::{PostParam, RenderError, RenderSink};

/// Logical time step per tick.
pub const DT: f64 = 0.01;

/// Audio-to-height coupling: `bass_scale = 1 + bass * BASS_SCALE_GAIN`.
const BASS_SCALE_GAIN: f64 = 0.3;

/// Emissive modulation gain for accent materials.
const EMISSIVE_GAIN: f64 = 2.0;

/// Bloom strength modulation gain from overall energy.
const BLOOM_GAIN: f64 = 1.2;

/// Oscillation constants per category: accents run faster and larger so the
/// neon buildings visibly pulse against the skyline.
const NORMAL_TIME_MUL: f64 = 1.0;
const NORMAL_INDEX_MUL: f64 = 0.1;
const NORMAL_AMPLITUDE: f64 = 0.05;
const ACCENT_TIME_MUL: f64 = 1.5;
const ACCENT_INDEX_MUL: f64 = 0.2;
const ACCENT_AMPLITUDE: f64 = 0.08;

/// Per-entity height scale for one tick.
///
/// `index` is the entity's position within its category partition, giving
/// each building a fixed phase offset that shows even at `t = 0`.
pub fn building_scale(bass_scale: f64, t: f64, index: usize, accent: bool) -> f64 {
    let (time_mul, index_mul, amplitude) = if accent {
        (ACCENT_TIME_MUL, ACCENT_INDEX_MUL, ACCENT_AMPLITUDE)
    } else {
        (NORMAL_TIME_MUL, NORMAL_INDEX_MUL, NORMAL_AMPLITUDE)
    };
    bass_scale + (t * time_mul + index as f64 * index_mul).sin() * amplitude
}

/// Outcome of one tick.
///
/// Renderer failures are recoverable: the tick always finishes best-effort,
/// counting failures and retaining the last error for the session owner.
#[derive(Debug, Default, Clone)]
pub struct TickStats {
    pub entities_updated: usize,
    pub render_failures: usize,
    pub last_render_error: Option<RenderError>,
    pub energies: SmoothedEnergies,
    pub time: f64,
}

/// Everything that persists across frames for one animation run.
pub struct AnimationSession {
    pub city: City,
    pub camera: CameraParams,
    smoothed: SmoothedEnergies,
    t: f64,
    audio_active: bool,
    warned_smoothing: bool,
}

impl AnimationSession {
    /// Take ownership of a generated city and prime every entity to its
    /// `t = 0` pose, so the fixed per-index phase offsets are visible before
    /// the first tick.
    pub fn new(city: City) -> Self {
        let mut session = Self {
            city,
            camera: CameraParams::default(),
            smoothed: SmoothedEnergies::default(),
            t: 0.0,
            audio_active: false,
            warned_smoothing: false,
        };
        session.prime_entities();
        session
    }

    /// Logical time accumulated so far.
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Current smoothed energies.
    pub fn smoothed(&self) -> SmoothedEnergies {
        self.smoothed
    }

    fn prime_entities(&mut self) {
        let City {
            ref mut entities,
            ref normal,
            ref cyan,
            ref magenta,
            ..
        } = self.city;

        for (list, accent) in [(normal, false), (cyan, true), (magenta, true)] {
            for (group_index, &entity_index) in list.iter().enumerate() {
                let entity = &mut entities[entity_index];
                let scale = building_scale(1.0, 0.0, group_index, accent);
                entity.height = entity.base_height * scale;
                entity.y = entity.height / 2.0;
            }
        }
    }

    /// Run one frame: pull and band the current spectrum, then advance the
    /// scene with it. A missing spectrum (nothing loaded, decode pending,
    /// paused) is not an error; the scene animates on zero energies.
    pub fn tick(
        &mut self,
        source: &mut dyn AudioSource,
        scene: &SceneConfig,
        post: &PostProcessConfig,
        sink: &mut dyn RenderSink,
    ) -> TickStats {
        let spectrum = if source.is_playing() {
            source.current_spectrum()
        } else {
            None
        };

        // Edge-triggered logging only; a stopped track must not spam per frame
        let active = spectrum.is_some();
        if active != self.audio_active {
            if active {
                debug!("audio spectrum available, energies live");
            } else {
                debug!("audio spectrum unavailable, running on zero energies");
            }
            self.audio_active = active;
        }

        let raw = spectrum
            .map(|sample| band_energies(&sample))
            .unwrap_or_default();
        self.tick_with_energies(raw, scene, post, sink)
    }

    /// Run one frame from already-banded energies.
    ///
    /// This is the whole per-tick algorithm; `tick` is a thin wrapper that
    /// feeds it from an [`AudioSource`]. Every entity in the tick sees the
    /// same smoothed energies.
    pub fn tick_with_energies(
        &mut self,
        raw: BandEnergies,
        scene: &SceneConfig,
        post: &PostProcessConfig,
        sink: &mut dyn RenderSink,
    ) -> TickStats {
        self.t += DT;

        let used_factor = self.smoothed.apply(raw, scene.smoothing_factor);
        if used_factor != scene.smoothing_factor && !self.warned_smoothing {
            warn!(
                requested = scene.smoothing_factor,
                used = used_factor,
                "smoothing factor outside [0,1], clamped"
            );
            self.warned_smoothing = true;
        }

        let mut stats = TickStats {
            time: self.t,
            energies: self.smoothed,
            ..TickStats::default()
        };

        let bass_scale = 1.0 + self.smoothed.bass * BASS_SCALE_GAIN;

        let City {
            ref mut entities,
            ref normal,
            ref cyan,
            ref magenta,
            respawn_distance,
        } = self.city;

        for (list, accent) in [(normal, false), (cyan, true), (magenta, true)] {
            for (group_index, &entity_index) in list.iter().enumerate() {
                let entity = &mut entities[entity_index];

                // Scroll state moves first so a teleported building animates
                // correctly within this same tick
                if scene.infinite_scroll {
                    entity.z += scene.scroll_speed;
                    if entity.z > scene.distance_threshold {
                        entity.z -= respawn_distance;
                    }
                }

                let scale = building_scale(bass_scale, self.t, group_index, accent);
                entity.height = entity.base_height * scale;
                entity.y = entity.height / 2.0;

                emit(&mut stats, push_transform(sink, entity));
                stats.entities_updated += 1;
            }
        }

        let cyan_emissive = post.emissive_intensity + self.smoothed.mid * EMISSIVE_GAIN;
        let magenta_emissive = post.emissive_intensity + self.smoothed.treble * EMISSIVE_GAIN;
        emit(
            &mut stats,
            sink.set_material_emissive(AccentColor::Cyan, cyan_emissive),
        );
        emit(
            &mut stats,
            sink.set_material_emissive(AccentColor::Magenta, magenta_emissive),
        );

        let bloom = post.bloom_strength + self.smoothed.overall * BLOOM_GAIN;
        emit(
            &mut stats,
            sink.set_post_process_param(PostParam::BloomStrength, bloom),
        );
        emit(
            &mut stats,
            sink.set_post_process_param(PostParam::BloomThreshold, post.bloom_threshold),
        );
        emit(
            &mut stats,
            sink.set_post_process_param(PostParam::BloomRadius, post.bloom_radius),
        );

        let pose = camera::pose_for(self.t, scene.infinite_scroll, &self.camera);
        emit(&mut stats, sink.set_camera_pose(pose.eye, pose.look_at));

        stats
    }
}

fn push_transform(sink: &mut dyn RenderSink, entity: &BuildingEntity) -> Result<(), RenderError> {
    sink.set_instance_transform(
        entity.category,
        entity.stable_id,
        DVec3::new(entity.x, entity.y, entity.z),
        DVec3::new(entity.width, entity.height, entity.depth),
    )
}

fn emit(stats: &mut TickStats, result: Result<(), RenderError>) {
    if let Err(error) = result {
        if stats.render_failures == 0 {
            warn!(%error, "renderer rejected update, continuing best-effort");
        }
        stats.render_failures += 1;
        stats.last_render_error = Some(error);
    }
}

/// Handle to a running animation thread.
pub struct SessionDriver {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<AnimationSession>,
}

impl SessionDriver {
    /// Signal the loop to stop, join it, and get the session back.
    pub fn stop(self) -> AnimationSession {
        self.stop.store(true, Ordering::Relaxed);
        match self.handle.join() {
            Ok(session) => session,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

/// Drive a session from its own thread at a fixed frame interval.
///
/// Configs are re-read from the live handle every frame. On stop, the sink
/// is disposed (releasing renderer-owned handles) and the session returned.
pub fn start<S, R>(
    mut session: AnimationSession,
    mut source: S,
    mut sink: R,
    configs: Arc<ConfigHandle>,
    frame_interval: Duration,
) -> SessionDriver
where
    S: AudioSource + Send + 'static,
    R: RenderSink + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let handle = thread::spawn(move || {
        while !stop_flag.load(Ordering::Relaxed) {
            let scene = configs.scene();
            let post = configs.post();
            session.tick(&mut source, &scene, &post, &mut sink);
            thread::sleep(frame_interval);
        }
        sink.dispose();
        session
    });

    SessionDriver { stop, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentSource;
    use crate::city::{generate, Category};
    use crate::params::CityConfig;
    use crate::render::{NullRenderer, RecordingRenderer, RenderCall};

    fn session() -> AnimationSession {
        AnimationSession::new(generate(&CityConfig::default()).unwrap())
    }

    fn pinned_bass() -> BandEnergies {
        BandEnergies {
            bass: 1.0,
            mid: 0.0,
            treble: 0.0,
            overall: 1.0,
        }
    }

    #[test]
    fn test_priming_applies_phase_offset_at_t0() {
        let session = session();

        for (group_index, &entity_index) in session.city.normal.iter().enumerate() {
            let entity = &session.city.entities[entity_index];
            let expected = entity.base_height * (1.0 + (group_index as f64 * 0.1).sin() * 0.05);
            assert!((entity.height - expected).abs() < 1e-12);
            assert_eq!(entity.y, entity.height / 2.0);
        }
        for (group_index, &entity_index) in session.city.cyan.iter().enumerate() {
            let entity = &session.city.entities[entity_index];
            let expected = entity.base_height * (1.0 + (group_index as f64 * 0.2).sin() * 0.08);
            assert!((entity.height - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_scroll_wrap_happens_within_one_tick() {
        let mut session = session();
        let scene = SceneConfig {
            infinite_scroll: true,
            scroll_speed: 0.3,
            ..SceneConfig::default()
        };
        let respawn = session.city.respawn_distance;
        assert_eq!(respawn, 80.0);

        session.city.entities[0].z = 39.95;
        session.city.entities[1].z = 0.0;

        session.tick_with_energies(
            BandEnergies::default(),
            &scene,
            &PostProcessConfig::default(),
            &mut NullRenderer,
        );

        // Crossed the threshold: advanced and teleported back in the same tick
        let wrapped = session.city.entities[0].z;
        assert!((wrapped - (39.95 + 0.3 - respawn)).abs() < 1e-12);

        // Below the threshold: only advanced
        assert!((session.city.entities[1].z - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_no_scroll_leaves_positions_alone() {
        let mut session = session();
        let scene = SceneConfig {
            infinite_scroll: false,
            ..SceneConfig::default()
        };
        let z_before: Vec<f64> = session.city.entities.iter().map(|e| e.z).collect();

        session.tick_with_energies(
            BandEnergies::default(),
            &scene,
            &PostProcessConfig::default(),
            &mut NullRenderer,
        );

        let z_after: Vec<f64> = session.city.entities.iter().map(|e| e.z).collect();
        assert_eq!(z_before, z_after);
    }

    #[test]
    fn test_tick_emits_one_transform_per_entity() {
        let mut session = session();
        let mut sink = RecordingRenderer::new();

        session.tick_with_energies(
            BandEnergies::default(),
            &SceneConfig::default(),
            &PostProcessConfig::default(),
            &mut sink,
        );

        let transforms: Vec<_> = sink.transforms().collect();
        assert_eq!(transforms.len(), session.city.len());

        let mut seen_ids: Vec<u32> = transforms
            .iter()
            .map(|call| match call {
                RenderCall::InstanceTransform { stable_id, .. } => *stable_id,
                _ => unreachable!(),
            })
            .collect();
        seen_ids.sort_unstable();
        seen_ids.dedup();
        assert_eq!(seen_ids.len(), session.city.len());

        // Transforms mirror entity state: y centered, scale carries the size
        for call in &transforms {
            if let RenderCall::InstanceTransform {
                stable_id,
                position,
                scale,
                ..
            } = call
            {
                let entity = &session.city.entities[*stable_id as usize];
                assert_eq!(position.y, entity.y);
                assert_eq!(scale.y, entity.height);
                assert_eq!(scale.x, entity.width);
                assert_eq!(scale.z, entity.depth);
            }
        }
    }

    #[test]
    fn test_modulation_outputs() {
        let mut session = session();
        let mut sink = RecordingRenderer::new();
        let scene = SceneConfig {
            smoothing_factor: 1.0,
            infinite_scroll: false,
            ..SceneConfig::default()
        };
        let raw = BandEnergies {
            bass: 0.0,
            mid: 1.0,
            treble: 0.5,
            overall: 1.0,
        };

        session.tick_with_energies(raw, &scene, &PostProcessConfig::default(), &mut sink);

        // Cyan tracks mid, magenta tracks treble
        assert!(sink.calls.contains(&RenderCall::MaterialEmissive {
            color: AccentColor::Cyan,
            intensity: 3.0,
        }));
        assert!(sink.calls.contains(&RenderCall::MaterialEmissive {
            color: AccentColor::Magenta,
            intensity: 2.0,
        }));

        assert!(sink.calls.contains(&RenderCall::PostProcessParam {
            param: PostParam::BloomStrength,
            value: 1.8 + 1.2,
        }));
        assert!(sink.calls.contains(&RenderCall::PostProcessParam {
            param: PostParam::BloomThreshold,
            value: 0.6,
        }));

        // Camera follows the orbit path at the session's clock
        let pose = camera::pose_for(session.time(), false, &session.camera);
        assert!(sink.calls.contains(&RenderCall::CameraPose {
            eye: pose.eye,
            look_at: pose.look_at,
        }));
    }

    #[test]
    fn test_render_failures_are_best_effort() {
        let mut session = session();
        let mut sink = RecordingRenderer {
            reject_transforms: true,
            ..RecordingRenderer::new()
        };

        let stats = session.tick_with_energies(
            BandEnergies::default(),
            &SceneConfig::default(),
            &PostProcessConfig::default(),
            &mut sink,
        );

        // Every transform failed, yet the tick finished the whole pass
        assert_eq!(stats.render_failures, session.city.len());
        assert_eq!(stats.entities_updated, session.city.len());
        assert!(stats.last_render_error.is_some());

        // Emissive, post and camera updates still went through
        assert!(sink
            .calls
            .iter()
            .any(|call| matches!(call, RenderCall::MaterialEmissive { .. })));
        assert!(sink
            .calls
            .iter()
            .any(|call| matches!(call, RenderCall::CameraPose { .. })));
    }

    #[test]
    fn test_out_of_range_smoothing_clamps_without_stopping() {
        let mut session = session();
        let scene = SceneConfig {
            smoothing_factor: 2.0,
            ..SceneConfig::default()
        };

        let stats = session.tick_with_energies(
            pinned_bass(),
            &scene,
            &PostProcessConfig::default(),
            &mut NullRenderer,
        );

        // Clamped to 1.0: smoothed tracks raw immediately
        assert_eq!(stats.energies.bass, 1.0);
        assert_eq!(stats.time, DT);
    }

    #[test]
    fn test_silent_source_runs_on_zero_energies() {
        let mut session = session();
        let mut source = SilentSource;

        let stats = session.tick(
            &mut source,
            &SceneConfig::default(),
            &PostProcessConfig::default(),
            &mut NullRenderer,
        );

        assert_eq!(stats.energies.bass, 0.0);
        assert_eq!(stats.energies.overall, 0.0);
        assert_eq!(session.time(), DT);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let config = CityConfig {
            grid_size: 20,
            spacing: 4.0,
            min_height: 3.0,
            max_height: 30.0,
            special_ratio: 0.25,
            ..CityConfig::default()
        };
        let mut session = AnimationSession::new(generate(&config).unwrap());
        let scene = SceneConfig {
            smoothing_factor: 0.15,
            infinite_scroll: false,
            ..SceneConfig::default()
        };
        let post = PostProcessConfig::default();

        for _ in 0..100 {
            session.tick_with_energies(pinned_bass(), &scene, &post, &mut NullRenderer);
        }

        let energies = session.smoothed();
        assert!((energies.bass - 1.0).abs() < 1e-4);
        assert_eq!(energies.mid, 0.0);
        assert_eq!(energies.treble, 0.0);

        // Normal heights oscillate within +-5% of base * 1.3
        for &entity_index in &session.city.normal {
            let entity = &session.city.entities[entity_index];
            let ratio = entity.height / entity.base_height;
            assert!(
                (ratio - 1.3).abs() <= 1.3 * 0.05,
                "height ratio {ratio} out of band"
            );
        }
    }

    #[test]
    fn test_driver_start_stop_round_trip() {
        struct FlagSink(Arc<AtomicBool>);
        impl RenderSink for FlagSink {
            fn set_instance_transform(
                &mut self,
                _: Category,
                _: u32,
                _: DVec3,
                _: DVec3,
            ) -> Result<(), RenderError> {
                Ok(())
            }
            fn set_material_emissive(&mut self, _: AccentColor, _: f64) -> Result<(), RenderError> {
                Ok(())
            }
            fn set_post_process_param(&mut self, _: PostParam, _: f64) -> Result<(), RenderError> {
                Ok(())
            }
            fn set_camera_pose(&mut self, _: DVec3, _: DVec3) -> Result<(), RenderError> {
                Ok(())
            }
            fn dispose(&mut self) {
                self.0.store(true, Ordering::Relaxed);
            }
        }

        let disposed = Arc::new(AtomicBool::new(false));
        let configs = Arc::new(ConfigHandle::default());

        let driver = start(
            session(),
            SilentSource,
            FlagSink(Arc::clone(&disposed)),
            configs,
            Duration::from_millis(1),
        );

        thread::sleep(Duration::from_millis(20));
        let session = driver.stop();

        assert!(session.time() > 0.0);
        assert!(disposed.load(Ordering::Relaxed));
    }
}
