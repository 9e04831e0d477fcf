//! Pyramid Planner
//!
//! Computes the ordered sequence of texture sizes for the blur pyramid and
//! owns the static table of level identifiers. [`plan`] is a pure function:
//! identical inputs always yield the identical size sequence, which the
//! backends exploit (the frame graph pre-declares every level from the plan
//! before any pass dependency is recorded).

use smallvec::SmallVec;

/// Upper bound on pyramid depth. The level identifier table is sized to this
/// once; per-frame iteration counts are clamped into `[1, MAX_PYRAMID_LEVELS]`.
pub const MAX_PYRAMID_LEVELS: usize = 16;

/// Size of one pyramid level in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelExtent {
    pub width: u32,
    pub height: u32,
}

impl LevelExtent {
    /// The next-coarser level: both axes floor-halved, never below 1×1.
    #[inline]
    #[must_use]
    pub fn halved(self) -> Self {
        Self {
            width: (self.width / 2).max(1),
            height: (self.height / 2).max(1),
        }
    }
}

/// Identifier pair for the textures of one pyramid depth.
#[derive(Debug, Clone, Copy)]
pub struct PyramidLevel {
    /// Label of the down-sampled texture at this depth.
    pub down: &'static str,
    /// Label of the up-sampled texture at this depth.
    pub up: &'static str,
}

/// The level identifier table, fixed at compile time so per-frame pass
/// recording never mints new names.
pub static PYRAMID_LEVELS: [PyramidLevel; MAX_PYRAMID_LEVELS] = [
    PyramidLevel { down: "blur_mip_down_0", up: "blur_mip_up_0" },
    PyramidLevel { down: "blur_mip_down_1", up: "blur_mip_up_1" },
    PyramidLevel { down: "blur_mip_down_2", up: "blur_mip_up_2" },
    PyramidLevel { down: "blur_mip_down_3", up: "blur_mip_up_3" },
    PyramidLevel { down: "blur_mip_down_4", up: "blur_mip_up_4" },
    PyramidLevel { down: "blur_mip_down_5", up: "blur_mip_up_5" },
    PyramidLevel { down: "blur_mip_down_6", up: "blur_mip_up_6" },
    PyramidLevel { down: "blur_mip_down_7", up: "blur_mip_up_7" },
    PyramidLevel { down: "blur_mip_down_8", up: "blur_mip_up_8" },
    PyramidLevel { down: "blur_mip_down_9", up: "blur_mip_up_9" },
    PyramidLevel { down: "blur_mip_down_10", up: "blur_mip_up_10" },
    PyramidLevel { down: "blur_mip_down_11", up: "blur_mip_up_11" },
    PyramidLevel { down: "blur_mip_down_12", up: "blur_mip_up_12" },
    PyramidLevel { down: "blur_mip_down_13", up: "blur_mip_up_13" },
    PyramidLevel { down: "blur_mip_down_14", up: "blur_mip_up_14" },
    PyramidLevel { down: "blur_mip_down_15", up: "blur_mip_up_15" },
];

/// Clamps a requested iteration count into the range the level table covers.
#[inline]
#[must_use]
pub fn clamp_iterations(requested: u32) -> usize {
    requested.clamp(1, MAX_PYRAMID_LEVELS as u32) as usize
}

/// Plans the per-level sizes for a blur pyramid.
///
/// Level 0 is the source extent divided by `downscale` (rounded to nearest);
/// each following level floor-halves both axes. No axis ever goes below 1,
/// so a 1×1 source at the maximum iteration count simply yields sixteen 1×1
/// levels instead of failing.
#[must_use]
pub fn plan(
    source_width: u32,
    source_height: u32,
    downscale: f32,
    iterations: usize,
) -> SmallVec<[LevelExtent; MAX_PYRAMID_LEVELS]> {
    let downscale = downscale.max(1.0);
    let iterations = iterations.clamp(1, MAX_PYRAMID_LEVELS);

    let mut extent = LevelExtent {
        width: ((source_width as f32 / downscale).round() as u32).max(1),
        height: ((source_height as f32 / downscale).round() as u32).max(1),
    };

    let mut levels = SmallVec::new();
    for _ in 0..iterations {
        levels.push(extent);
        extent = extent.halved();
    }
    levels
}
