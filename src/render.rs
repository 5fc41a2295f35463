//! Boundary to the external renderer.
//!
//! The animator pushes per-instance transforms, material emissives,
//! post-process parameters, and the camera pose through [`RenderSink`] once
//! per tick; it never reads renderer state back. GPU handles live entirely
//! behind the sink and are released via [`RenderSink::dispose`] at session
//! teardown.

use glam::DVec3;
use thiserror::Error;

use crate::city::{AccentColor, Category};

/// Failure reported by the external renderer for a single call.
///
/// Recoverable: the tick keeps going best-effort and surfaces the failure
/// through `TickStats`.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("instance slot {stable_id} rejected transform: {reason}")]
    TransformRejected { stable_id: u32, reason: String },

    #[error("renderer unavailable: {0}")]
    Unavailable(String),
}

/// Post-processing parameters addressable through the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostParam {
    BloomStrength,
    BloomThreshold,
    BloomRadius,
}

/// Renderer-side operations the core drives each tick.
pub trait RenderSink {
    /// Update the instance transform bound to `stable_id` within `category`.
    fn set_instance_transform(
        &mut self,
        category: Category,
        stable_id: u32,
        position: DVec3,
        scale: DVec3,
    ) -> Result<(), RenderError>;

    /// Update the emissive intensity of one accent material.
    fn set_material_emissive(
        &mut self,
        color: AccentColor,
        intensity: f64,
    ) -> Result<(), RenderError>;

    /// Update one post-processing parameter.
    fn set_post_process_param(&mut self, param: PostParam, value: f64) -> Result<(), RenderError>;

    /// Update the camera pose.
    fn set_camera_pose(&mut self, eye: DVec3, look_at: DVec3) -> Result<(), RenderError>;

    /// Release renderer-owned resources at session teardown.
    fn dispose(&mut self) {}
}

/// Sink that accepts and discards everything. Useful for headless runs.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn set_instance_transform(
        &mut self,
        _category: Category,
        _stable_id: u32,
        _position: DVec3,
        _scale: DVec3,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    fn set_material_emissive(
        &mut self,
        _color: AccentColor,
        _intensity: f64,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    fn set_post_process_param(&mut self, _param: PostParam, _value: f64) -> Result<(), RenderError> {
        Ok(())
    }

    fn set_camera_pose(&mut self, _eye: DVec3, _look_at: DVec3) -> Result<(), RenderError> {
        Ok(())
    }
}

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    InstanceTransform {
        category: Category,
        stable_id: u32,
        position: DVec3,
        scale: DVec3,
    },
    MaterialEmissive {
        color: AccentColor,
        intensity: f64,
    },
    PostProcessParam {
        param: PostParam,
        value: f64,
    },
    CameraPose {
        eye: DVec3,
        look_at: DVec3,
    },
}

/// Sink that records every call, for deterministic harnesses and tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
    pub disposed: bool,
    /// When set, every instance-transform call is rejected, exercising the
    /// best-effort error path.
    pub reject_transforms: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transforms(&self) -> impl Iterator<Item = &RenderCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, RenderCall::InstanceTransform { .. }))
    }
}

impl RenderSink for RecordingRenderer {
    fn set_instance_transform(
        &mut self,
        category: Category,
        stable_id: u32,
        position: DVec3,
        scale: DVec3,
    ) -> Result<(), RenderError> {
        if self.reject_transforms {
            return Err(RenderError::TransformRejected {
                stable_id,
                reason: "rejected by test sink".to_string(),
            });
        }
        self.calls.push(RenderCall::InstanceTransform {
            category,
            stable_id,
            position,
            scale,
        });
        Ok(())
    }

    fn set_material_emissive(
        &mut self,
        color: AccentColor,
        intensity: f64,
    ) -> Result<(), RenderError> {
        self.calls
            .push(RenderCall::MaterialEmissive { color, intensity });
        Ok(())
    }

    fn set_post_process_param(&mut self, param: PostParam, value: f64) -> Result<(), RenderError> {
        self.calls.push(RenderCall::PostProcessParam { param, value });
        Ok(())
    }

    fn set_camera_pose(&mut self, eye: DVec3, look_at: DVec3) -> Result<(), RenderError> {
        self.calls.push(RenderCall::CameraPose { eye, look_at });
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
