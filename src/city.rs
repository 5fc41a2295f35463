//! Procedural city layout generation.
//!
//! A seeded grid of box "buildings" with jittered placement, randomized
//! heights, and a Bernoulli draw deciding which buildings get the neon
//! accent treatment. Accent buildings alternate cyan/magenta in generation
//! order. Generation is the only place entities are created; the animator
//! mutates position and height afterwards but never size, category, or id.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::params::{CityConfig, ConfigError};

/// Neon accent color, alternating over the accent subsequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccentColor {
    Cyan,
    Magenta,
}

/// Building category. Every site that branches on category matches
/// exhaustively, so adding a variant is a compile error until handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Normal,
    Accent(AccentColor),
}

/// One procedurally generated building.
///
/// `x`, `y`, `z` and `height` are animated every frame; `width`, `depth`,
/// `base_height`, `category` and `stable_id` are fixed at generation.
/// `stable_id` is the renderer's binding key for this instance's GPU slot
/// and is never reused within one population. `y` is always `height / 2`
/// so buildings grow from ground level.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingEntity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub base_height: f64,
    pub height: f64,
    pub category: Category,
    pub stable_id: u32,
}

/// A generated building population with its category partitions.
///
/// The partition index lists are built once here and never refiltered;
/// the animator walks them directly every tick.
#[derive(Debug, Clone)]
pub struct City {
    pub entities: Vec<BuildingEntity>,
    /// Indices into `entities`, in generation order per partition.
    pub normal: Vec<usize>,
    pub cyan: Vec<usize>,
    pub magenta: Vec<usize>,
    /// Wrap-around teleport distance for infinite scroll (grid world size).
    pub respawn_distance: f64,
}

impl City {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Base footprint size; width/depth land in `[BASE_FOOTPRINT, BASE_FOOTPRINT
/// + FOOTPRINT_VARIATION]` regardless of height, keeping the blocky aspect.
const BASE_FOOTPRINT: f64 = 1.5;
const FOOTPRINT_VARIATION: f64 = 0.5;

/// Generate a `grid_size x grid_size` city centered at the origin.
///
/// Deterministic for a given config + seed. Degenerate configurations are
/// rejected before any entity is produced, so a previously generated
/// population stays valid when this fails.
pub fn generate(config: &CityConfig) -> Result<City, ConfigError> {
    config.validate()?;

    let variation = clamped_unit(config.building_variation, "building_variation");
    let special_ratio = clamped_unit(config.special_ratio, "special_ratio");

    let grid_size = config.grid_size as usize;
    let half = config.grid_size as f64 * config.spacing / 2.0;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut entities = Vec::with_capacity(grid_size * grid_size);
    let mut normal = Vec::new();
    let mut cyan = Vec::new();
    let mut magenta = Vec::new();
    let mut accent_count = 0usize;

    for i in 0..grid_size {
        for j in 0..grid_size {
            let base_x = i as f64 * config.spacing - half;
            let base_z = j as f64 * config.spacing - half;

            let jitter_x = (rng.random::<f64>() - 0.5) * config.spacing * variation;
            let jitter_z = (rng.random::<f64>() - 0.5) * config.spacing * variation;

            let height =
                config.min_height + rng.random::<f64>() * (config.max_height - config.min_height);
            let width = BASE_FOOTPRINT + rng.random::<f64>() * FOOTPRINT_VARIATION;
            let depth = BASE_FOOTPRINT + rng.random::<f64>() * FOOTPRINT_VARIATION;

            let is_accent = rng.random::<f64>() < special_ratio;

            let index = entities.len();
            let category = if is_accent {
                // Alternate colors over the accent subsequence in generation order
                let color = if accent_count % 2 == 0 {
                    AccentColor::Cyan
                } else {
                    AccentColor::Magenta
                };
                accent_count += 1;
                match color {
                    AccentColor::Cyan => cyan.push(index),
                    AccentColor::Magenta => magenta.push(index),
                }
                Category::Accent(color)
            } else {
                normal.push(index);
                Category::Normal
            };

            entities.push(BuildingEntity {
                x: base_x + jitter_x,
                y: height / 2.0,
                z: base_z + jitter_z,
                width,
                depth,
                base_height: height,
                height,
                category,
                stable_id: index as u32,
            });
        }
    }

    Ok(City {
        entities,
        normal,
        cyan,
        magenta,
        respawn_distance: config.grid_size as f64 * config.spacing,
    })
}

fn clamped_unit(value: f64, name: &str) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        warn!(value, "{name} outside [0,1], clamping");
        value.clamp(0.0, 1.0)
    }
}
