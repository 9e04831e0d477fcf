//! Blur & Depth-of-Field Configuration
//!
//! Pure data consumed read-only by the pass sequencer each frame. Ranged
//! parameters live behind clamping setters so that an out-of-range value can
//! never reach the GPU; flags are plain public fields.

// ============================================================================
// DepthOfFieldSettings
// ============================================================================

/// Depth-of-field configuration.
///
/// Pixels within `near_range` in front of (or `far_range` behind) the focus
/// distance blend toward the sharp original image; everything beyond those
/// ranges stays fully blurred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthOfFieldSettings {
    /// Whether the final resolve blends by scene depth.
    ///
    /// When disabled (or when the host supplies no depth image) the blurred
    /// pyramid result is written back directly.
    pub enabled: bool,

    /// Distance to the focus plane, in world units. Range `[0.1, 50.0]`.
    focus_distance: f32,

    /// Sharp zone extent in front of the focus plane. Range `[0.1, 10.0]`.
    near_range: f32,

    /// Sharp-to-blurred falloff behind the focus plane. Range `[0.1, 20.0]`.
    far_range: f32,
}

impl Default for DepthOfFieldSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            focus_distance: 10.0,
            near_range: 0.1,
            far_range: 10.0,
        }
    }
}

impl DepthOfFieldSettings {
    /// Returns the focus plane distance.
    #[inline]
    #[must_use]
    pub fn focus_distance(&self) -> f32 {
        self.focus_distance
    }

    /// Returns the sharp range in front of the focus plane.
    #[inline]
    #[must_use]
    pub fn near_range(&self) -> f32 {
        self.near_range
    }

    /// Returns the falloff range behind the focus plane.
    #[inline]
    #[must_use]
    pub fn far_range(&self) -> f32 {
        self.far_range
    }

    /// Sets the focus plane distance, clamped to `[0.1, 50.0]`.
    pub fn set_focus_distance(&mut self, distance: f32) {
        self.focus_distance = distance.clamp(0.1, 50.0);
    }

    /// Sets the sharp range in front of the focus plane, clamped to `[0.1, 10.0]`.
    pub fn set_near_range(&mut self, range: f32) {
        self.near_range = range.clamp(0.1, 10.0);
    }

    /// Sets the falloff range behind the focus plane, clamped to `[0.1, 20.0]`.
    pub fn set_far_range(&mut self, range: f32) {
        self.far_range = range.clamp(0.1, 20.0);
    }
}

// ============================================================================
// DualKawaseSettings
// ============================================================================

/// Dual-Kawase blur configuration (pure data, validated on write).
///
/// # Usage
///
/// ```rust,ignore
/// let mut settings = DualKawaseSettings::default();
/// settings.set_blur_radius(4.0);
/// settings.set_iterations(3);
/// settings.depth_of_field.enabled = false;
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualKawaseSettings {
    /// Sampling offset scale fed to the downsample/upsample kernels.
    /// Range `[0.0, 15.0]`.
    blur_radius: f32,

    /// Number of pyramid levels. Range `[1, 10]` at this surface; the
    /// sequencer re-clamps against the level table each frame.
    iterations: u32,

    /// Resolution divisor for pyramid level 0. Range `[1.0, 10.0]`.
    downscale: f32,

    /// Depth-of-field blend configuration.
    pub depth_of_field: DepthOfFieldSettings,
}

impl Default for DualKawaseSettings {
    fn default() -> Self {
        Self {
            blur_radius: 1.0,
            iterations: 2,
            downscale: 2.0,
            depth_of_field: DepthOfFieldSettings::default(),
        }
    }
}

impl DualKawaseSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the blur radius.
    #[inline]
    #[must_use]
    pub fn blur_radius(&self) -> f32 {
        self.blur_radius
    }

    /// Returns the configured iteration count.
    #[inline]
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns the level-0 downscale factor.
    #[inline]
    #[must_use]
    pub fn downscale(&self) -> f32 {
        self.downscale
    }

    /// Sets the blur radius, clamped to `[0.0, 15.0]`.
    ///
    /// A radius of 0.0 still runs the pyramid; the kernels then sample at
    /// plain half-pixel offsets, which gives the mildest possible blur.
    pub fn set_blur_radius(&mut self, radius: f32) {
        self.blur_radius = radius.clamp(0.0, 15.0);
    }

    /// Sets the iteration count, clamped to `[1, 10]`.
    ///
    /// Each additional iteration halves the working resolution once more and
    /// roughly doubles the blur footprint.
    pub fn set_iterations(&mut self, iterations: u32) {
        self.iterations = iterations.clamp(1, 10);
    }

    /// Sets the level-0 downscale factor, clamped to `[1.0, 10.0]`.
    pub fn set_downscale(&mut self, downscale: f32) {
        self.downscale = downscale.clamp(1.0, 10.0);
    }
}
