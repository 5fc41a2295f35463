//! Live-tunable configuration shared between a control surface and the
//! animation loop.
//!
//! Single writer (UI/control thread), multiple readers (the animator, once
//! per tick). Readers load a whole-struct snapshot, so a tick never sees a
//! half-written update; writers publish a fresh snapshot and never block
//! the frame path.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::params::{PostProcessConfig, SceneConfig};

/// Snapshot store for the scene and post-processing tunables.
#[derive(Debug)]
pub struct ConfigHandle {
    scene: ArcSwap<SceneConfig>,
    post: ArcSwap<PostProcessConfig>,
}

impl ConfigHandle {
    pub fn new(scene: SceneConfig, post: PostProcessConfig) -> Self {
        Self {
            scene: ArcSwap::from_pointee(scene),
            post: ArcSwap::from_pointee(post),
        }
    }

    /// Current scene snapshot.
    pub fn scene(&self) -> Arc<SceneConfig> {
        self.scene.load_full()
    }

    /// Current post-processing snapshot.
    pub fn post(&self) -> Arc<PostProcessConfig> {
        self.post.load_full()
    }

    /// Publish a new scene configuration.
    pub fn set_scene(&self, scene: SceneConfig) {
        self.scene.store(Arc::new(scene));
    }

    /// Publish a new post-processing configuration.
    pub fn set_post(&self, post: PostProcessConfig) {
        self.post.store(Arc::new(post));
    }

    /// Modify the scene configuration in place (clone, mutate, publish).
    pub fn update_scene(&self, mutate: impl FnOnce(&mut SceneConfig)) {
        let mut scene = (*self.scene.load_full()).clone();
        mutate(&mut scene);
        self.set_scene(scene);
    }

    /// Modify the post-processing configuration in place.
    pub fn update_post(&self, mutate: impl FnOnce(&mut PostProcessConfig)) {
        let mut post = (*self.post.load_full()).clone();
        mutate(&mut post);
        self.set_post(post);
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(SceneConfig::default(), PostProcessConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_updates() {
        let handle = ConfigHandle::default();
        assert!(handle.scene().infinite_scroll);

        handle.update_scene(|scene| {
            scene.infinite_scroll = false;
            scene.scroll_speed = 0.5;
        });

        let snapshot = handle.scene();
        assert!(!snapshot.infinite_scroll);
        assert_eq!(snapshot.scroll_speed, 0.5);
    }

    #[test]
    fn test_old_snapshots_stay_coherent() {
        let handle = ConfigHandle::default();
        let before = handle.post();

        handle.update_post(|post| post.bloom_strength = 3.0);

        // The reader that loaded earlier keeps its coherent view
        assert_eq!(before.bloom_strength, 1.8);
        assert_eq!(handle.post().bloom_strength, 3.0);
    }
}
