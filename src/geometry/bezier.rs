//! Bezier stroke synthesis
//!
//! Produces the sequence of points a simulated hand follows between two
//! screen positions. Control points are jittered so that no two strokes
//! between the same endpoints look alike.

use rand::Rng;

use super::{GeometryError, Point2D};

/// Samples taken per unit of speed
const SAMPLES_PER_SPEED: u32 = 100;

/// Row `n` of Pascal's triangle
pub fn pascal_row(n: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(n + 1);
    let mut value = 1.0;
    row.push(value);
    for k in 0..n {
        value = value * (n - k) as f64 / (k + 1) as f64;
        row.push(value);
    }
    row
}

/// Evaluate the Bezier curve over `control` at parameter `t`
fn bezier_point(control: &[Point2D], coefficients: &[f64], t: f64) -> Point2D {
    let degree = control.len() - 1;
    let u = 1.0 - t;

    control
        .iter()
        .zip(coefficients)
        .enumerate()
        .fold(Point2D::default(), |acc, (i, (p, c))| {
            let weight = c * t.powi(i as i32) * u.powi((degree - i) as i32);
            Point2D::new(acc.x + weight * p.x, acc.y + weight * p.y)
        })
}

/// Offset one axis of the start point by a signed share of the axis delta
fn control_coordinate<R: Rng + ?Sized>(rng: &mut R, start: f64, end: f64, deviation: u32) -> f64 {
    let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let percent = rng.random_range(deviation / 2..=deviation);
    let delta = (end.ceil() - start.ceil()).abs();

    start + sign * delta * 0.01 * f64::from(percent)
}

/// Build a humanized path from `start` to `end`
///
/// `deviation` is the maximum control point offset as a percentage of the
/// distance on each axis. The cubic curve is sampled `speed * 100 + 1`
/// times and the exact destination is appended, so the path always has
/// `speed * 100 + 2` points and always ends on `end`.
pub fn bezier_path<R: Rng + ?Sized>(
    rng: &mut R,
    start: Point2D,
    end: Point2D,
    deviation: u32,
    speed: u32,
) -> Result<Vec<Point2D>, GeometryError> {
    if speed == 0 {
        return Err(GeometryError::ZeroSpeed);
    }

    let mut jitter = || {
        Point2D::new(
            control_coordinate(&mut *rng, start.x, end.x, deviation),
            control_coordinate(&mut *rng, start.y, end.y, deviation),
        )
    };
    let control = [start, jitter(), jitter(), end];
    let coefficients = pascal_row(control.len() - 1);

    let steps = speed * SAMPLES_PER_SPEED;
    let mut path: Vec<Point2D> = (0..=steps)
        .map(|i| f64::from(i) / f64::from(steps))
        .map(|t| bezier_point(&control, &coefficients, t))
        .collect();
    // Floating point error can leave the last sample a hair off target
    path.push(end);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pascal_rows() {
        assert_eq!(pascal_row(0), vec![1.0]);
        assert_eq!(pascal_row(3), vec![1.0, 3.0, 3.0, 1.0]);
        assert_eq!(pascal_row(4), vec![1.0, 4.0, 6.0, 4.0, 1.0]);
    }

    #[test]
    fn test_path_length_and_endpoint() {
        let mut rng = StdRng::seed_from_u64(3);
        let start = Point2D::new(12.0, 700.0);
        let end = Point2D::new(913.5, 41.25);

        for speed in 1..=4 {
            let path = bezier_path(&mut rng, start, end, 30, speed).unwrap();
            assert_eq!(path.len(), (speed * 100 + 2) as usize);
            assert_eq!(*path.last().unwrap(), end);
            assert_eq!(path[0], start);
        }
    }

    #[test]
    fn test_zero_speed_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let res = bezier_path(&mut rng, Point2D::default(), Point2D::new(5.0, 5.0), 10, 0);
        assert_eq!(res, Err(GeometryError::ZeroSpeed));
    }

    #[test]
    fn test_zero_deviation_is_straight() {
        let mut rng = StdRng::seed_from_u64(9);
        let start = Point2D::new(0.0, 0.0);
        let end = Point2D::new(100.0, 50.0);

        let path = bezier_path(&mut rng, start, end, 0, 1).unwrap();
        for p in &path {
            assert!((p.y - p.x / 2.0).abs() < 1e-9, "off the line: {p}");
        }
    }

    #[test]
    fn test_stationary_stroke() {
        let mut rng = StdRng::seed_from_u64(5);
        let p = Point2D::new(40.0, 40.0);

        let path = bezier_path(&mut rng, p, p, 50, 1).unwrap();
        assert!(path.iter().all(|q| (q.x - 40.0).abs() < 1e-9 && (q.y - 40.0).abs() < 1e-9));
    }
}
