//! Color-cluster target acquisition
//!
//! Finds the largest connected blob of pixels matching a target color and
//! reduces it to a single point to aim at.

use std::collections::VecDeque;

use image::{Rgb, Rgba, RgbaImage};

use super::Point2D;

/// What to look for on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTarget {
    /// Target color
    pub rgb: Rgb<u8>,
    /// Maximum per-channel difference still counted as a match
    pub tolerance: u8,
    /// Smallest cluster worth aiming at
    pub min_cluster_size: usize,
}

impl ColorTarget {
    /// Create a new color target
    pub fn new(rgb: [u8; 3], tolerance: u8, min_cluster_size: usize) -> Self {
        Self {
            rgb: Rgb(rgb),
            tolerance,
            min_cluster_size,
        }
    }

    /// Check a pixel against the target, ignoring alpha
    pub fn matches(&self, pixel: &Rgba<u8>) -> bool {
        pixel.0[..3]
            .iter()
            .zip(self.rgb.0.iter())
            .all(|(&a, &b)| a.abs_diff(b) <= self.tolerance)
    }
}

impl std::fmt::Display for ColorTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.rgb.0;
        write!(
            f,
            "color=({r}, {g}, {b}) tolerance={} min_cluster_size={}",
            self.tolerance, self.min_cluster_size
        )
    }
}

/// Breadth-first fill from a matching seed pixel
///
/// Marks every reached pixel in `visited` and returns the coordinates of
/// the connected matching region (4-connectivity).
fn flood_fill(
    image: &RgbaImage,
    seed: (u32, u32),
    target: &ColorTarget,
    visited: &mut [bool],
) -> Vec<(u32, u32)> {
    let (width, height) = image.dimensions();
    let index = |x: u32, y: u32| y as usize * width as usize + x as usize;

    let mut queue = VecDeque::from([seed]);
    visited[index(seed.0, seed.1)] = true;
    let mut region = Vec::new();

    while let Some((x, y)) = queue.pop_front() {
        region.push((x, y));

        let neighbors = [
            (x > 0).then(|| (x - 1, y)),
            (x + 1 < width).then(|| (x + 1, y)),
            (y > 0).then(|| (x, y - 1)),
            (y + 1 < height).then(|| (x, y + 1)),
        ];

        for (nx, ny) in neighbors.into_iter().flatten() {
            let i = index(nx, ny);
            if !visited[i] && target.matches(image.get_pixel(nx, ny)) {
                visited[i] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    region
}

/// Largest connected region matching `target`, scanning in raster order
///
/// Ties keep the region found first. Returns an empty vector when no pixel
/// matches.
pub fn largest_cluster(image: &RgbaImage, target: &ColorTarget) -> Vec<(u32, u32)> {
    let (width, height) = image.dimensions();
    let mut visited = vec![false; width as usize * height as usize];
    let mut largest = Vec::new();

    for (x, y, pixel) in image.enumerate_pixels() {
        if visited[y as usize * width as usize + x as usize] || !target.matches(pixel) {
            continue;
        }

        let region = flood_fill(image, (x, y), target, &mut visited);
        if region.len() > largest.len() {
            largest = region;
        }
    }

    largest
}

/// Centroid of the largest matching cluster
///
/// Returns `None` when the largest cluster has fewer than
/// `min_cluster_size` pixels. The centroid is the integer-truncated mean of
/// the member coordinates.
pub fn locate_cluster(image: &RgbaImage, target: &ColorTarget) -> Option<Point2D> {
    let cluster = largest_cluster(image, target);
    if cluster.is_empty() || cluster.len() < target.min_cluster_size {
        return None;
    }

    let n = cluster.len() as u64;
    let (sum_x, sum_y) = cluster.iter().fold((0u64, 0u64), |(sx, sy), &(x, y)| {
        (sx + u64::from(x), sy + u64::from(y))
    });

    Some(Point2D::new((sum_x / n) as f64, (sum_y / n) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    const BACKGROUND: Rgba<u8> = Rgba([20, 30, 40, 255]);
    const RED: Rgba<u8> = Rgba([200, 10, 10, 255]);

    fn screen(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, BACKGROUND)
    }

    #[test]
    fn test_block_beats_noise() {
        let mut img = screen(64, 48);
        draw_filled_rect_mut(&mut img, Rect::at(30, 10).of_size(5, 5), RED);
        for &(x, y) in &[(2, 2), (60, 40), (10, 30), (45, 5)] {
            img.put_pixel(x, y, RED);
        }

        let target = ColorTarget::new([200, 10, 10], 0, 4);
        assert_eq!(largest_cluster(&img, &target).len(), 25);
        assert_eq!(locate_cluster(&img, &target), Some(Point2D::new(32.0, 12.0)));
    }

    #[test]
    fn test_noise_only_not_found() {
        let mut img = screen(32, 32);
        img.put_pixel(3, 3, RED);
        img.put_pixel(20, 9, RED);

        let target = ColorTarget::new([200, 10, 10], 0, 4);
        assert_eq!(locate_cluster(&img, &target), None);
    }

    #[test]
    fn test_diagonal_pixels_not_connected() {
        let mut img = screen(8, 8);
        for i in 0..4 {
            img.put_pixel(i, i, RED);
        }

        let target = ColorTarget::new([200, 10, 10], 0, 2);
        assert_eq!(largest_cluster(&img, &target).len(), 1);
        assert_eq!(locate_cluster(&img, &target), None);
    }

    #[test]
    fn test_tolerance() {
        let mut img = screen(16, 16);
        draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(4, 2), Rgba([205, 5, 14, 255]));

        let strict = ColorTarget::new([200, 10, 10], 3, 1);
        let loose = ColorTarget::new([200, 10, 10], 5, 1);
        assert_eq!(locate_cluster(&img, &strict), None);
        // Mean of x in 0..4 is 1.5, truncated
        assert_eq!(locate_cluster(&img, &loose), Some(Point2D::new(1.0, 0.0)));
    }

    #[test]
    fn test_largest_of_two_blocks() {
        let mut img = screen(40, 40);
        draw_filled_rect_mut(&mut img, Rect::at(1, 1).of_size(3, 3), RED);
        draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(6, 4), RED);

        let target = ColorTarget::new([200, 10, 10], 0, 4);
        assert_eq!(largest_cluster(&img, &target).len(), 24);
        assert_eq!(locate_cluster(&img, &target), Some(Point2D::new(22.0, 21.0)));
    }

    #[test]
    fn test_alpha_ignored() {
        let mut img = screen(4, 4);
        img.put_pixel(1, 1, Rgba([200, 10, 10, 0]));

        let target = ColorTarget::new([200, 10, 10], 0, 1);
        assert_eq!(locate_cluster(&img, &target), Some(Point2D::new(1.0, 1.0)));
    }

    #[test]
    fn test_color_matching() {
        let target = ColorTarget::new([100, 100, 100], 10, 1);
        assert!(target.matches(&Rgba([105, 95, 100, 255])));
        assert!(!ColorTarget::new([100, 100, 100], 3, 1).matches(&Rgba([105, 95, 100, 255])));
    }
}
