//! Per-Frame Host Inputs
//!
//! Everything the host renderer must describe about the frame being
//! processed: the target extent and the camera the frame was rendered from.
//! GPU resources (the color/depth views) are supplied separately to the
//! execution backends.

/// The kind of camera context a frame originates from.
///
/// Only [`Game`](Self::Game) frames are processed; editor scene views and
/// material/asset preview renders pass through untouched so that tooling
/// imagery is never corrupted by the blur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    /// A real in-game view. Processed.
    Game,
    /// An editor scene view. Skipped.
    SceneView,
    /// A thumbnail / asset preview render. Skipped.
    Preview,
}

impl CameraKind {
    /// Returns `true` for camera contexts the pipeline processes.
    #[inline]
    #[must_use]
    pub fn is_game(self) -> bool {
        matches!(self, Self::Game)
    }
}

/// Camera parameters for the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameCamera {
    /// Near clip plane distance, in world units.
    pub near: f32,
    /// Far clip plane distance, in world units.
    pub far: f32,
    /// The camera context this frame was rendered from.
    pub kind: CameraKind,
}

impl FrameCamera {
    /// Creates a game-camera description from clip plane distances.
    #[must_use]
    pub fn new(near: f32, far: f32) -> Self {
        Self {
            near,
            far,
            kind: CameraKind::Game,
        }
    }

    /// Overrides the camera kind.
    #[must_use]
    pub fn with_kind(mut self, kind: CameraKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Description of one frame to process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDesc {
    /// Color target width in pixels.
    pub width: u32,
    /// Color target height in pixels.
    pub height: u32,
    /// The camera that produced the frame.
    pub camera: FrameCamera,
}

impl FrameDesc {
    /// Creates a frame description.
    #[must_use]
    pub fn new(width: u32, height: u32, camera: FrameCamera) -> Self {
        Self {
            width,
            height,
            camera,
        }
    }
}
