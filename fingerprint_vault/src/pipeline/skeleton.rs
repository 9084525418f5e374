//! Fingerprint Vault - Zhang-Suen Thinning
//!
//! Reduces ridge blobs to 1-pixel-wide centrelines. Deletions are applied to
//! a single grid as they happen, so later pixels in the same sub-iteration see
//! earlier deletions.

use image::GrayImage;

use super::filters::FOREGROUND;

/// The 8-neighbourhood `p2..p9` of an interior pixel, clockwise from north,
/// as 0/1 values
pub(crate) fn neighbourhood(grid: &[u8], width: usize, x: usize, y: usize) -> [u8; 8] {
    let at = |nx: usize, ny: usize| (grid[ny * width + nx] == FOREGROUND) as u8;
    [
        at(x, y - 1),
        at(x + 1, y - 1),
        at(x + 1, y),
        at(x + 1, y + 1),
        at(x, y + 1),
        at(x - 1, y + 1),
        at(x - 1, y),
        at(x - 1, y - 1),
    ]
}

/// Number of 0 -> 1 transitions around the closed ring `p2, ..., p9, p2`
fn transitions(p: &[u8; 8]) -> usize {
    (0..8).filter(|&k| p[k] == 0 && p[(k + 1) % 8] == 1).count()
}

#[derive(Clone, Copy)]
enum SubIteration {
    First,
    Second,
}

impl SubIteration {
    fn removable(self, p: &[u8; 8]) -> bool {
        let [p2, p3, p4, p5, p6, p7, p8, p9] = *p;
        let neighbours = (p2 + p3 + p4 + p5 + p6 + p7 + p8 + p9) as usize;

        if !(2..=6).contains(&neighbours) || transitions(p) != 1 {
            return false;
        }

        match self {
            SubIteration::First => p2 * p4 * p6 == 0 && p4 * p6 * p8 == 0,
            SubIteration::Second => p2 * p4 * p8 == 0 && p2 * p6 * p8 == 0,
        }
    }
}

/// Delete removable pixels in raster order; returns the number deleted
fn sweep(grid: &mut [u8], width: usize, height: usize, pass: SubIteration) -> usize {
    let mut deleted = 0;
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let idx = y * width + x;
            if grid[idx] != FOREGROUND {
                continue;
            }
            if pass.removable(&neighbourhood(grid, width, x, y)) {
                grid[idx] = 0;
                deleted += 1;
            }
        }
    }
    deleted
}

/// Thin a binary ridge mask until a full pass deletes nothing
pub fn thin(binary: &GrayImage) -> GrayImage {
    let (width, height) = binary.dimensions();
    let (w, h) = (width as usize, height as usize);
    let mut grid = binary.as_raw().clone();

    let mut passes = 0usize;
    loop {
        passes += 1;
        let deleted = sweep(&mut grid, w, h, SubIteration::First)
            + sweep(&mut grid, w, h, SubIteration::Second);
        if deleted == 0 {
            break;
        }
    }

    log::debug!("Thinning converged after {} pass(es)", passes);

    GrayImage::from_raw(width, height, grid)
        .unwrap_or_else(|| GrayImage::new(width, height))
}
