//! Fingerprint Vault - Ridge Enhancement
//!
//! Turns the isolated grayscale region into a binary ridge mask.

use image::GrayImage;

use super::filters::{self, Border};
use crate::config::PipelineConfig;

/// Structuring element size for ridge cleanup
const RIDGE_KERNEL: usize = 3;

const HIST_SIZE: usize = 256;

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into `tiles` x `tiles` tiles (padded by reflection when
/// the size is not a multiple), each tile gets a clipped equalization table,
/// and every pixel is bilinearly interpolated between its four nearest tiles.
pub fn clahe(img: &GrayImage, clip_limit: f64, tiles: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let tiles = tiles.max(1) as usize;
    let (w, h) = (width as usize, height as usize);

    let (padded_w, padded_h) = if w % tiles == 0 && h % tiles == 0 {
        (w, h)
    } else {
        (w + tiles - w % tiles, h + tiles - h % tiles)
    };
    let tile_w = padded_w / tiles;
    let tile_h = padded_h / tiles;
    let tile_area = tile_w * tile_h;

    let sample = |x: usize, y: usize| {
        let sx = Border::Reflect101.index(x as isize, w);
        let sy = Border::Reflect101.index(y as isize, h);
        img.as_raw()[sy * w + sx]
    };

    let clip = if clip_limit > 0.0 {
        ((clip_limit * tile_area as f64 / HIST_SIZE as f64) as usize).max(1)
    } else {
        0
    };
    let lut_scale = 255.0 / tile_area as f32;

    let mut luts = vec![[0u8; HIST_SIZE]; tiles * tiles];
    for ty in 0..tiles {
        for tx in 0..tiles {
            let mut hist = [0usize; HIST_SIZE];
            for y in ty * tile_h..(ty + 1) * tile_h {
                for x in tx * tile_w..(tx + 1) * tile_w {
                    hist[sample(x, y) as usize] += 1;
                }
            }

            if clip > 0 {
                let mut clipped = 0;
                for bin in hist.iter_mut() {
                    if *bin > clip {
                        clipped += *bin - clip;
                        *bin = clip;
                    }
                }

                let batch = clipped / HIST_SIZE;
                let mut residual = clipped - batch * HIST_SIZE;
                for bin in hist.iter_mut() {
                    *bin += batch;
                }
                if residual > 0 {
                    let step = (HIST_SIZE / residual).max(1);
                    let mut i = 0;
                    while i < HIST_SIZE && residual > 0 {
                        hist[i] += 1;
                        residual -= 1;
                        i += step;
                    }
                }
            }

            let lut = &mut luts[ty * tiles + tx];
            let mut sum = 0usize;
            for (i, &count) in hist.iter().enumerate() {
                sum += count;
                lut[i] = (sum as f32 * lut_scale).round_ties_even().clamp(0.0, 255.0) as u8;
            }
        }
    }

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;
    let last = tiles as isize - 1;

    GrayImage::from_fn(width, height, |x, y| {
        let tyf = y as f32 * inv_th - 0.5;
        let ty1 = tyf.floor() as isize;
        let ya = tyf - ty1 as f32;
        let (ty1, ty2) = (ty1.max(0) as usize, (ty1 + 1).min(last) as usize);

        let txf = x as f32 * inv_tw - 0.5;
        let tx1 = txf.floor() as isize;
        let xa = txf - tx1 as f32;
        let (tx1, tx2) = (tx1.max(0) as usize, (tx1 + 1).min(last) as usize);

        let v = img.get_pixel(x, y)[0] as usize;
        let top = luts[ty1 * tiles + tx1][v] as f32 * (1.0 - xa)
            + luts[ty1 * tiles + tx2][v] as f32 * xa;
        let bottom = luts[ty2 * tiles + tx1][v] as f32 * (1.0 - xa)
            + luts[ty2 * tiles + tx2][v] as f32 * xa;
        let res = top * (1.0 - ya) + bottom * ya;

        image::Luma([res.round_ties_even().clamp(0.0, 255.0) as u8])
    })
}

/// Normalize, equalize, binarize and clean the region
pub fn enhance_ridges(region: &GrayImage, config: &PipelineConfig) -> GrayImage {
    let normalized = filters::normalize_min_max(region);
    let equalized = clahe(&normalized, config.clahe_clip_limit, config.clahe_tiles);
    let binary = filters::adaptive_threshold_inv(
        &equalized,
        config.adaptive_block_size as usize,
        config.adaptive_offset,
    );
    filters::open(&filters::close(&binary, RIDGE_KERNEL), RIDGE_KERNEL)
}
