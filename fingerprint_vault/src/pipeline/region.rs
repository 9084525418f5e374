//! Fingerprint Vault - Region Isolation
//!
//! Locates the fingerprint on the sensor image and blanks the background.
//!
//! ```text
//! gray ─ blur 5x5 ─ otsu (inv) ─ close/open 5x5 ─ outer contours
//!                                                   │
//!              largest area ─ bbox + margin ─ crop ─ mask
//! ```

use std::collections::VecDeque;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use super::filters::{self, Border, FOREGROUND};

/// Structuring element size for background cleanup
const CLEANUP_KERNEL: usize = 5;

/// Axis-aligned rectangle in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Outer border of one 8-connected foreground blob
#[derive(Debug, Clone)]
pub struct Contour {
    /// Border pixels in tracing order
    pub points: Vec<(i64, i64)>,
    /// Pixels belonging to the blob
    pixels: Vec<usize>,
}

impl Contour {
    /// Polygon area enclosed by the traced border (shoelace)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let (x0, y0) = self.points[i];
                let (x1, y1) = self.points[(i + 1) % n];
                x0 * y1 - x1 * y0
            })
            .sum();
        twice.abs() as f64 / 2.0
    }

    /// Tight bounding rectangle of the border
    pub fn bounding_rect(&self) -> Rect {
        let (mut min_x, mut min_y) = (i64::MAX, i64::MAX);
        let (mut max_x, mut max_y) = (i64::MIN, i64::MIN);
        for &(x, y) in &self.points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Rect {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        }
    }
}

/// Neighbour offsets, clockwise from north (y grows downwards)
const RING: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];
const WEST: usize = 6;

fn is_foreground(img: &GrayImage, x: i64, y: i64) -> bool {
    x >= 0
        && y >= 0
        && (x as u32) < img.width()
        && (y as u32) < img.height()
        && img.get_pixel(x as u32, y as u32)[0] != 0
}

/// Follow the outer border starting at the blob's first raster pixel.
///
/// The start pixel's west neighbour is background, so the search around it
/// begins there.
fn trace_outer_border(img: &GrayImage, start: (i64, i64)) -> Vec<(i64, i64)> {
    let step = |p: (i64, i64), dir: usize| (p.0 + RING[dir].0, p.1 + RING[dir].1);

    let first_dir = (0..8)
        .map(|k| (WEST + k) % 8)
        .find(|&dir| {
            let (x, y) = step(start, dir);
            is_foreground(img, x, y)
        });

    let Some(first_dir) = first_dir else {
        return vec![start];
    };
    let first = step(start, first_dir);

    let mut points = vec![start];
    let mut current = start;
    // direction from `current` back to the previous border pixel
    let mut back = first_dir;

    loop {
        let next_dir = (1..=8)
            .map(|k| (back + 8 - k) % 8)
            .find(|&dir| {
                let (x, y) = step(current, dir);
                is_foreground(img, x, y)
            })
            .unwrap_or(back);
        let next = step(current, next_dir);

        if next == start && current == first {
            break;
        }

        points.push(next);
        back = (next_dir + 4) % 8;
        current = next;
    }

    points
}

/// Extract the outer contour of every 8-connected foreground blob, in raster
/// order of each blob's first pixel
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour> {
    let (width, height) = binary.dimensions();
    let (w, h) = (width as usize, height as usize);
    let src = binary.as_raw();
    let mut visited = vec![false; w * h];
    let mut contours = Vec::new();

    for seed in 0..w * h {
        if src[seed] == 0 || visited[seed] {
            continue;
        }

        let mut pixels = Vec::new();
        let mut queue = VecDeque::from([seed]);
        visited[seed] = true;

        while let Some(idx) = queue.pop_front() {
            pixels.push(idx);
            let (x, y) = ((idx % w) as i64, (idx / w) as i64);
            for &(dx, dy) in &RING {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if src[n] != 0 && !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }

        let start = ((seed % w) as i64, (seed / w) as i64);
        contours.push(Contour {
            points: trace_outer_border(binary, start),
            pixels,
        });
    }

    contours
}

/// Blob pixels plus every hole it encloses
fn filled_mask(contour: &Contour, width: u32, height: u32) -> Vec<bool> {
    let (w, h) = (width as usize, height as usize);
    let mut blob = vec![false; w * h];
    for &idx in &contour.pixels {
        blob[idx] = true;
    }

    // 4-connected flood of the background from the image frame
    let mut outside = vec![false; w * h];
    let mut queue = VecDeque::new();
    for y in 0..h {
        for x in 0..w {
            let on_frame = x == 0 || y == 0 || x == w - 1 || y == h - 1;
            let idx = y * w + x;
            if on_frame && !blob[idx] {
                outside[idx] = true;
                queue.push_back(idx);
            }
        }
    }
    while let Some(idx) = queue.pop_front() {
        let (x, y) = (idx % w, idx / w);
        let neighbours = [
            (x > 0).then(|| idx - 1),
            (x + 1 < w).then(|| idx + 1),
            (y > 0).then(|| idx - w),
            (y + 1 < h).then(|| idx + w),
        ];
        for n in neighbours.into_iter().flatten() {
            if !blob[n] && !outside[n] {
                outside[n] = true;
                queue.push_back(n);
            }
        }
    }

    outside.into_iter().map(|o| !o).collect()
}

/// Cropped, background-suppressed fingerprint region
#[derive(Debug, Clone)]
pub struct IsolatedRegion {
    /// Masked crop of the grayscale scan
    pub image: GrayImage,
    /// Crop origin in source image coordinates
    pub offset: (u32, u32),
    /// Crop rectangle, `None` when no contour was found
    pub bounds: Option<Rect>,
}

/// Expand by `margin`, clamped to the image.
///
/// The width and height grow by the full `2 * margin` before being limited by
/// the right and bottom edges, even when the left or top edge was clamped.
fn expand_rect(rect: Rect, margin: u32, width: u32, height: u32) -> Rect {
    let x = rect.x.saturating_sub(margin);
    let y = rect.y.saturating_sub(margin);
    let grow = margin.saturating_mul(2);
    Rect {
        x,
        y,
        width: width.saturating_sub(x).min(rect.width.saturating_add(grow)),
        height: height.saturating_sub(y).min(rect.height.saturating_add(grow)),
    }
}

/// Find the fingerprint region of `gray`; falls back to the whole image
pub fn isolate_region(gray: &GrayImage, margin: u32) -> IsolatedRegion {
    let blurred = filters::gaussian_blur(gray, CLEANUP_KERNEL, Border::Reflect101);
    let level = filters::otsu_level(&blurred);
    let binary = filters::threshold_binary_inv(&blurred, level);
    let cleaned = filters::open(&filters::close(&binary, CLEANUP_KERNEL), CLEANUP_KERNEL);

    let contours = find_external_contours(&cleaned);
    let largest = contours.iter().fold(None::<&Contour>, |best, c| match best {
        Some(b) if b.area() >= c.area() => Some(b),
        _ => Some(c),
    });

    let Some(largest) = largest else {
        log::info!("No fingerprint contour found, using full image");
        return IsolatedRegion {
            image: gray.clone(),
            offset: (0, 0),
            bounds: None,
        };
    };

    let (width, height) = gray.dimensions();
    let rect = expand_rect(largest.bounding_rect(), margin, width, height);
    let mask = filled_mask(largest, width, height);

    let image = GrayImage::from_fn(rect.width, rect.height, |cx, cy| {
        let (x, y) = (rect.x + cx, rect.y + cy);
        let inside = mask[y as usize * width as usize + x as usize];
        let value = if inside { gray.get_pixel(x, y)[0] } else { 0 };
        image::Luma([value])
    });

    log::debug!(
        "Fingerprint region {}x{} at ({}, {}) from {} contour(s)",
        rect.width,
        rect.height,
        rect.x,
        rect.y,
        contours.len()
    );

    IsolatedRegion {
        image,
        offset: (rect.x, rect.y),
        bounds: Some(rect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square(img: &mut GrayImage, x0: u32, y0: u32, size: u32, value: u8) {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                img.put_pixel(x, y, Luma([value]));
            }
        }
    }

    #[test]
    fn test_square_contour() {
        let mut img = GrayImage::new(10, 10);
        square(&mut img, 2, 3, 4, FOREGROUND);

        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);

        let contour = &contours[0];
        assert_eq!(contour.points.len(), 12);
        assert_eq!(contour.area(), 9.0);
        assert_eq!(
            contour.bounding_rect(),
            Rect { x: 2, y: 3, width: 4, height: 4 }
        );
    }

    #[test]
    fn test_single_pixel_contour() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, Luma([FOREGROUND]));

        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![(2, 2)]);
        assert_eq!(contours[0].area(), 0.0);
    }

    #[test]
    fn test_diagonal_blobs_are_connected() {
        let mut img = GrayImage::new(6, 6);
        img.put_pixel(1, 1, Luma([FOREGROUND]));
        img.put_pixel(2, 2, Luma([FOREGROUND]));
        img.put_pixel(4, 4, Luma([FOREGROUND]));

        assert_eq!(find_external_contours(&img).len(), 2);
    }

    #[test]
    fn test_filled_mask_covers_holes() {
        let mut img = GrayImage::new(9, 9);
        square(&mut img, 1, 1, 7, FOREGROUND);
        square(&mut img, 3, 3, 3, 0);

        let contours = find_external_contours(&img);
        let mask = filled_mask(&contours[0], 9, 9);

        assert!(mask[4 * 9 + 4]);
        assert!(!mask[0]);
    }

    #[test]
    fn test_expand_rect_clamps() {
        let rect = Rect { x: 5, y: 50, width: 10, height: 10 };
        let expanded = expand_rect(rect, 10, 64, 64);
        assert_eq!(expanded, Rect { x: 0, y: 40, width: 30, height: 24 });
    }

    #[test]
    fn test_expand_rect_huge_margin() {
        let rect = Rect { x: 20, y: 30, width: 10, height: 10 };
        let expanded = expand_rect(rect, u32::MAX / 2 + 1, 64, 64);
        assert_eq!(expanded, Rect { x: 0, y: 0, width: 64, height: 64 });
    }

    #[test]
    fn test_huge_margin_crops_whole_image() {
        let mut gray = GrayImage::from_pixel(100, 100, Luma([230]));
        square(&mut gray, 40, 30, 20, 40);

        let region = isolate_region(&gray, u32::MAX);
        assert_eq!(region.bounds, Some(Rect { x: 0, y: 0, width: 100, height: 100 }));
        assert_eq!(region.offset, (0, 0));
    }

    #[test]
    fn test_blank_image_falls_back() {
        let gray = GrayImage::from_pixel(64, 64, Luma([255]));
        let region = isolate_region(&gray, 10);

        assert_eq!(region.offset, (0, 0));
        assert!(region.bounds.is_none());
        assert_eq!(region.image, gray);
    }

    #[test]
    fn test_dark_blob_is_cropped_and_masked() {
        let mut gray = GrayImage::from_pixel(100, 100, Luma([230]));
        square(&mut gray, 40, 30, 20, 40);

        let region = isolate_region(&gray, 10);
        let bounds = region.bounds.unwrap();

        assert!(bounds.x <= 40 && bounds.y <= 30);
        assert!(bounds.x + bounds.width >= 60 && bounds.y + bounds.height >= 50);
        assert!(bounds.x + bounds.width <= 100 && bounds.y + bounds.height <= 100);
        assert_eq!(region.offset, (bounds.x, bounds.y));

        // Background corner of the crop is masked out, blob interior is kept
        assert_eq!(region.image.get_pixel(0, 0)[0], 0);
        let (cx, cy) = (50 - bounds.x, 40 - bounds.y);
        assert_eq!(region.image.get_pixel(cx, cy)[0], 40);
    }

    #[test]
    fn test_tiny_image_does_not_panic() {
        let gray = GrayImage::from_pixel(1, 1, Luma([0]));
        let region = isolate_region(&gray, 10);
        assert!(region.image.width() <= 1 && region.image.height() <= 1);
    }
}
