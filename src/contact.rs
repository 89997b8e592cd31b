//! Contacts as delivered by the detection pipeline, one list per frame.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn max(&self) -> f64 {
        self.x.max(self.y)
    }

    pub fn min(&self) -> f64 {
        self.x.min(self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    /// Tracking index across frames. Untracked contacts are ignored.
    pub index: Option<usize>,

    /// `Some(false)` marks a rejected contact (e.g. a palm).
    pub valid: Option<bool>,

    /// `Some(false)` marks an update that must not be reported this frame.
    pub stable: Option<bool>,

    /// Normalized centroid in [0, 1].
    pub mean: Vector2,

    /// Normalized extents along both principal axes, in no particular order.
    pub size: Vector2,

    /// Normalized rotation in [0, 1], 1 being 180 degrees.
    pub orientation: f64,
}

impl Contact {
    pub fn is_valid(&self) -> bool {
        self.valid.unwrap_or(true)
    }

    pub fn is_stable(&self) -> bool {
        self.stable.unwrap_or(true)
    }
}
