//! Geometry primitives for randomized motion
//!
//! Point sampling inside click boxes, Bezier stroke synthesis and
//! color-cluster target acquisition. Nothing in here touches a device.

pub mod bezier;
pub mod clickbox;
pub mod cluster;

pub use bezier::{bezier_path, pascal_row};
pub use clickbox::ClickBox;
pub use cluster::{largest_cluster, locate_cluster, ColorTarget};

/// A real-valued screen coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Round to the nearest pixel
    pub fn rounded(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<(i32, i32)> for Point2D {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(f64::from(x), f64::from(y))
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Geometry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid number of vertices, expected {expected} got {found}")]
    VertexCount { expected: usize, found: usize },
    #[error("stroke speed must be at least 1")]
    ZeroSpeed,
}
