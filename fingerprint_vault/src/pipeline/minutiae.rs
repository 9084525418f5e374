//! Fingerprint Vault - Minutiae Extraction
//!
//! Crossing-number classification of skeleton pixels, greedy distance
//! filtering in raster order, then canonical (x, y) ordering.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use super::filters::FOREGROUND;
use super::skeleton::neighbourhood;

/// Minutia topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinutiaKind {
    /// Crossing number 1
    RidgeEnding,
    /// Crossing number 3
    Bifurcation,
}

impl MinutiaKind {
    /// Byte code used in the digest encoding (the crossing number)
    pub fn code(self) -> u8 {
        match self {
            MinutiaKind::RidgeEnding => 1,
            MinutiaKind::Bifurcation => 3,
        }
    }

    fn from_crossing_number(cn: u32) -> Option<Self> {
        match cn {
            1 => Some(MinutiaKind::RidgeEnding),
            3 => Some(MinutiaKind::Bifurcation),
            _ => None,
        }
    }
}

/// Feature point in source image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinutiaPoint {
    pub x: u32,
    pub y: u32,
    pub kind: MinutiaKind,
}

impl MinutiaPoint {
    pub fn distance(&self, other: &MinutiaPoint) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Crossing number of an 8-neighbourhood
pub fn crossing_number(p: &[u8; 8]) -> u32 {
    let sum: u32 = (0..8)
        .map(|k| (p[k] as i32 - p[(k + 1) % 8] as i32).unsigned_abs())
        .sum();
    sum / 2
}

/// Classify every interior skeleton pixel, in raster order, shifting
/// coordinates by `offset`
pub fn extract_raw(skeleton: &GrayImage, offset: (u32, u32)) -> Vec<MinutiaPoint> {
    let (width, height) = skeleton.dimensions();
    let (w, h) = (width as usize, height as usize);
    let grid = skeleton.as_raw();
    let mut points = Vec::new();

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            if grid[y * w + x] != FOREGROUND {
                continue;
            }
            let cn = crossing_number(&neighbourhood(grid, w, x, y));
            if let Some(kind) = MinutiaKind::from_crossing_number(cn) {
                points.push(MinutiaPoint {
                    x: x as u32 + offset.0,
                    y: y as u32 + offset.1,
                    kind,
                });
            }
        }
    }
    points
}

/// Keep a point only if it is at least `min_distance` from every point kept
/// before it. Order-dependent: callers pass raster order.
pub fn filter_by_distance(points: &[MinutiaPoint], min_distance: f64) -> Vec<MinutiaPoint> {
    let mut kept: Vec<MinutiaPoint> = Vec::new();
    for point in points {
        if kept.iter().all(|k| point.distance(k) >= min_distance) {
            kept.push(*point);
        }
    }
    kept
}

/// Canonical minutiae set: filtered, then sorted by x then y
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinutiaeSet {
    points: Vec<MinutiaPoint>,
}

impl MinutiaeSet {
    /// Filter raster-ordered points and sort the survivors
    pub fn from_raster_order(raw: &[MinutiaPoint], min_distance: f64) -> Self {
        let mut points = filter_by_distance(raw, min_distance);
        points.sort_by_key(|p| (p.x, p.y));
        Self { points }
    }

    pub fn points(&self) -> &[MinutiaPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn count(&self, kind: MinutiaKind) -> usize {
        self.points.iter().filter(|p| p.kind == kind).count()
    }

    /// Flat encoding: per point `x (u32 BE) || y (u32 BE) || kind code`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.points.len() * 9);
        for p in &self.points {
            out.extend_from_slice(&p.x.to_be_bytes());
            out.extend_from_slice(&p.y.to_be_bytes());
            out.push(p.kind.code());
        }
        out
    }
}

/// Extract, filter and canonicalize minutiae from a skeleton
pub fn extract_minutiae(
    skeleton: &GrayImage,
    offset: (u32, u32),
    min_distance: f64,
) -> MinutiaeSet {
    let raw = extract_raw(skeleton, offset);
    let set = MinutiaeSet::from_raster_order(&raw, min_distance);

    log::debug!(
        "Minutiae: {} raw, {} retained ({} endings, {} bifurcations)",
        raw.len(),
        set.len(),
        set.count(MinutiaKind::RidgeEnding),
        set.count(MinutiaKind::Bifurcation)
    );
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::skeleton::thin;
    use image::Luma;

    fn point(x: u32, y: u32, kind: MinutiaKind) -> MinutiaPoint {
        MinutiaPoint { x, y, kind }
    }

    fn line(img: &mut GrayImage, xs: std::ops::RangeInclusive<u32>, ys: std::ops::RangeInclusive<u32>) {
        for y in ys {
            for x in xs.clone() {
                img.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }

    #[test]
    fn test_crossing_numbers() {
        assert_eq!(crossing_number(&[0, 0, 1, 0, 0, 0, 0, 0]), 1);
        assert_eq!(crossing_number(&[0, 0, 1, 0, 0, 0, 1, 0]), 2);
        assert_eq!(crossing_number(&[0, 0, 1, 0, 1, 0, 1, 0]), 3);
        assert_eq!(crossing_number(&[0; 8]), 0);
    }

    #[test]
    fn test_straight_ridge_has_two_endings() {
        let mut img = GrayImage::new(64, 64);
        line(&mut img, 10..=49, 10..=12);

        let set = extract_minutiae(&thin(&img), (0, 0), 10.0);

        assert_eq!(set.count(MinutiaKind::RidgeEnding), 2);
        assert_eq!(set.count(MinutiaKind::Bifurcation), 0);
        assert_eq!(
            set.points(),
            &[
                point(10, 12, MinutiaKind::RidgeEnding),
                point(49, 12, MinutiaKind::RidgeEnding)
            ]
        );
    }

    #[test]
    fn test_tee_junction() {
        let mut img = GrayImage::new(64, 64);
        line(&mut img, 10..=50, 20..=20);
        line(&mut img, 30..=30, 21..=50);

        let set = extract_minutiae(&thin(&img), (100, 200), 10.0);

        assert_eq!(
            set.points(),
            &[
                point(110, 220, MinutiaKind::RidgeEnding),
                point(130, 220, MinutiaKind::Bifurcation),
                point(130, 250, MinutiaKind::RidgeEnding),
                point(150, 220, MinutiaKind::RidgeEnding),
            ]
        );
    }

    #[test]
    fn test_filter_is_greedy_in_given_order() {
        let a = point(0, 0, MinutiaKind::RidgeEnding);
        let b = point(8, 0, MinutiaKind::RidgeEnding);
        let c = point(16, 0, MinutiaKind::Bifurcation);

        // a kept, b too close to a, c far enough from a
        assert_eq!(filter_by_distance(&[a, b, c], 10.0), vec![a, c]);
        // starting from b suppresses both neighbours
        assert_eq!(filter_by_distance(&[b, a, c], 10.0), vec![b]);
    }

    #[test]
    fn test_filter_boundary_distance_is_kept() {
        let a = point(0, 0, MinutiaKind::RidgeEnding);
        let b = point(6, 8, MinutiaKind::RidgeEnding);
        assert_eq!(filter_by_distance(&[a, b], 10.0).len(), 2);
    }

    #[test]
    fn test_retained_points_respect_min_distance() {
        let raw: Vec<MinutiaPoint> = (0..20u32)
            .flat_map(|y| (0..20u32).map(move |x| point(x * 3, y * 4, MinutiaKind::RidgeEnding)))
            .collect();
        let set = MinutiaeSet::from_raster_order(&raw, 10.0);

        for (i, p) in set.points().iter().enumerate() {
            for q in &set.points()[i + 1..] {
                assert!(p.distance(q) >= 10.0);
            }
        }
    }

    #[test]
    fn test_canonical_order() {
        let raw = vec![
            point(50, 5, MinutiaKind::RidgeEnding),
            point(10, 40, MinutiaKind::Bifurcation),
            point(10, 20, MinutiaKind::RidgeEnding),
            point(30, 60, MinutiaKind::RidgeEnding),
        ];
        let set = MinutiaeSet::from_raster_order(&raw, 10.0);
        let keys: Vec<(u32, u32)> = set.points().iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(keys, vec![(10, 20), (10, 40), (30, 60), (50, 5)]);
    }

    #[test]
    fn test_encoding_layout() {
        let set = MinutiaeSet::from_raster_order(
            &[
                point(0x0102, 7, MinutiaKind::Bifurcation),
                point(1, 300, MinutiaKind::RidgeEnding),
            ],
            10.0,
        );
        assert_eq!(
            set.to_bytes(),
            vec![
                0, 0, 0, 1, 0, 0, 1, 44, 1, //
                0, 0, 1, 2, 0, 0, 0, 7, 3,
            ]
        );
    }

    #[test]
    fn test_empty_skeleton() {
        let set = extract_minutiae(&GrayImage::new(10, 10), (0, 0), 10.0);
        assert!(set.is_empty());
        assert!(set.to_bytes().is_empty());
    }
}
