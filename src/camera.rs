//! Procedural camera poses as pure functions of logical time.
//!
//! The camera never reacts to audio; it only follows the clock. Which path
//! is active follows the live scroll toggle, and switching mid-animation
//! snaps with no transition blend.

use glam::DVec3;

use crate::params::{CameraParams, OrbitCamera, ScrollCamera};

/// Eye position plus look-at target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: DVec3,
    pub look_at: DVec3,
}

/// Circular orbit around the city with a slow vertical bob.
pub fn orbit_pose(t: f64, p: &OrbitCamera) -> CameraPose {
    let angle = t * p.angular_speed;
    let eye = DVec3::new(
        angle.cos() * p.radius,
        p.height + (t * p.bob_frequency).sin() * p.bob_amplitude,
        angle.sin() * p.radius,
    );
    CameraPose {
        eye,
        look_at: DVec3::from_array(p.target),
    }
}

/// Low fixed vantage with a small lateral sway, for conveyor mode.
pub fn scroll_pose(t: f64, p: &ScrollCamera) -> CameraPose {
    let eye = DVec3::new(
        (t * p.sway_frequency).sin() * p.sway_amplitude,
        p.height,
        p.depth,
    );
    CameraPose {
        eye,
        look_at: DVec3::from_array(p.target),
    }
}

/// Pose for the current tick given the live scroll toggle.
pub fn pose_for(t: f64, infinite_scroll: bool, params: &CameraParams) -> CameraPose {
    if infinite_scroll {
        scroll_pose(t, &params.scroll)
    } else {
        orbit_pose(t, &params.orbit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_starts_on_radius() {
        let p = OrbitCamera::default();
        let pose = orbit_pose(0.0, &p);

        // t=0: angle 0, bob 0
        assert_eq!(pose.eye, DVec3::new(p.radius, p.height, 0.0));
        assert_eq!(pose.look_at, DVec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn test_orbit_stays_on_cylinder() {
        let p = OrbitCamera::default();
        for step in 0..200 {
            let t = step as f64 * 0.5;
            let pose = orbit_pose(t, &p);

            let horizontal = (pose.eye.x * pose.eye.x + pose.eye.z * pose.eye.z).sqrt();
            assert!((horizontal - p.radius).abs() < 1e-9);
            assert!((pose.eye.y - p.height).abs() <= p.bob_amplitude + 1e-9);
        }
    }

    #[test]
    fn test_scroll_pose_sways_at_fixed_height() {
        let p = ScrollCamera::default();
        for step in 0..100 {
            let t = step as f64 * 0.1;
            let pose = scroll_pose(t, &p);

            assert!(pose.eye.x.abs() <= p.sway_amplitude + 1e-9);
            assert_eq!(pose.eye.y, p.height);
            assert_eq!(pose.eye.z, p.depth);
            assert_eq!(pose.look_at, DVec3::new(0.0, 10.0, -50.0));
        }
    }

    #[test]
    fn test_mode_switch_snaps() {
        let params = CameraParams::default();
        let t = 12.34;

        assert_eq!(pose_for(t, false, &params), orbit_pose(t, &params.orbit));
        assert_eq!(pose_for(t, true, &params), scroll_pose(t, &params.scroll));
    }
}
