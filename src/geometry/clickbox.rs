//! Quadrilateral click boxes
//!
//! Clicking the exact same pixel for hours on end is an easy pattern to
//! spot. A click box describes the on-screen target as a quadrilateral and
//! hands out a fresh point inside it on every use.

use rand::Rng;

use super::{GeometryError, Point2D};

const NUM_VERTICES: usize = 4;

/// Four ordered vertices forming a quadrilateral
#[derive(Debug, Clone, PartialEq)]
pub struct ClickBox {
    vertices: [Point2D; NUM_VERTICES],
}

impl ClickBox {
    /// Build a click box, failing unless exactly four vertices are given
    pub fn new(vertices: &[Point2D]) -> Result<Self, GeometryError> {
        let vertices: [Point2D; NUM_VERTICES] =
            vertices
                .try_into()
                .map_err(|_| GeometryError::VertexCount {
                    expected: NUM_VERTICES,
                    found: vertices.len(),
                })?;

        Ok(Self { vertices })
    }

    /// The vertices in declaration order
    pub fn vertices(&self) -> &[Point2D; NUM_VERTICES] {
        &self.vertices
    }

    /// Axis-aligned bounding box as (min, max) corners
    pub fn bounds(&self) -> (Point2D, Point2D) {
        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for v in &self.vertices[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        (min, max)
    }

    /// Sample a point inside the box
    ///
    /// The box is split along the v0-v2 diagonal and each half is picked
    /// with probability 0.5 regardless of its area, so irregular boxes are
    /// only approximately uniform.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point2D {
        let [v0, v1, v2, v3] = self.vertices;
        if rng.random_bool(0.5) {
            random_point_in_triangle(rng, v0, v1, v2)
        } else {
            random_point_in_triangle(rng, v0, v2, v3)
        }
    }
}

impl std::fmt::Display for ClickBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.vertices.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Uniform point inside triangle (a, b, c) by folded barycentric sampling
fn random_point_in_triangle<R: Rng + ?Sized>(
    rng: &mut R,
    a: Point2D,
    b: Point2D,
    c: Point2D,
) -> Point2D {
    let mut s: f64 = rng.random();
    let mut t: f64 = rng.random();

    if s + t > 1.0 {
        s = 1.0 - s;
        t = 1.0 - t;
    }

    Point2D::new(
        a.x + s * (b.x - a.x) + t * (c.x - a.x),
        a.y + s * (b.y - a.y) + t * (c.y - a.y),
    )
}
