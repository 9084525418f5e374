//! Fingerprint Vault - Grayscale Filters
//!
//! Smoothing, thresholding and morphology over 8-bit grids. Every function
//! returns a new image; inputs are never modified.

use image::GrayImage;

/// Foreground value in binary images
pub const FOREGROUND: u8 = 255;

/// Out-of-range index handling for neighbourhood operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101,
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate,
}

impl Border {
    /// Map a possibly out-of-range index onto `0..len`
    pub fn index(self, i: isize, len: usize) -> usize {
        let len = len as isize;
        if len <= 1 {
            return 0;
        }
        match self {
            Border::Replicate => i.clamp(0, len - 1) as usize,
            Border::Reflect101 => {
                let mut i = i;
                while i < 0 || i >= len {
                    if i < 0 {
                        i = -i;
                    }
                    if i >= len {
                        i = 2 * len - 2 - i;
                    }
                }
                i as usize
            }
        }
    }
}

/// 1-D Gaussian kernel of odd size `ksize`, sigma derived from the size
pub fn gaussian_kernel(ksize: usize) -> Vec<f64> {
    match ksize {
        1 => return vec![1.0],
        3 => return vec![0.25, 0.5, 0.25],
        5 => return vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => {
            return vec![
                0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
            ]
        }
        _ => {}
    }

    let sigma = ((ksize as f64 - 1.0) * 0.5 - 1.0) * 0.3 + 0.8;
    let center = (ksize as f64 - 1.0) * 0.5;
    let scale = -0.5 / (sigma * sigma);

    let raw: Vec<f64> = (0..ksize)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();

    raw.into_iter().map(|v| v / sum).collect()
}

/// Separable Gaussian blur with a square `ksize` window
pub fn gaussian_blur(img: &GrayImage, ksize: usize, border: Border) -> GrayImage {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let kernel = gaussian_kernel(ksize);
    let radius = (ksize / 2) as isize;
    let src = img.as_raw();

    let mut horizontal = vec![0f64; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            horizontal[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sx = border.index(x as isize + k as isize - radius, w);
                    row[sx] as f64 * weight
                })
                .sum();
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let value: f64 = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sy = border.index(y as isize + k as isize - radius, h);
                    horizontal[sy * w + x] * weight
                })
                .sum();
            out.put_pixel(x as u32, y as u32, image::Luma([saturate_half_up(value)]));
        }
    }
    out
}

fn saturate_half_up(value: f64) -> u8 {
    (value + 0.5).floor().clamp(0.0, 255.0) as u8
}

fn saturate_half_even(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Otsu's global threshold level
pub fn otsu_level(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for &v in img.as_raw() {
        histogram[v as usize] += 1;
    }

    let total = img.as_raw().len();
    if total == 0 {
        return 0;
    }
    let scale = 1.0 / total as f64;

    let mu: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum::<f64>()
        * scale;

    let epsilon = f32::EPSILON as f64;
    let (mut q1, mut mu1) = (0.0f64, 0.0f64);
    let (mut max_sigma, mut level) = (0.0f64, 0u8);

    for (i, &count) in histogram.iter().enumerate() {
        let p_i = count as f64 * scale;
        mu1 *= q1;
        q1 += p_i;
        let q2 = 1.0 - q1;

        if q1.min(q2) < epsilon || q1.max(q2) > 1.0 - epsilon {
            continue;
        }

        mu1 = (mu1 + i as f64 * p_i) / q1;
        let mu2 = (mu - q1 * mu1) / q2;
        let sigma = q1 * q2 * (mu1 - mu2) * (mu1 - mu2);
        if sigma > max_sigma {
            max_sigma = sigma;
            level = i as u8;
        }
    }
    level
}

/// Pixels at or below `level` become foreground
pub fn threshold_binary_inv(img: &GrayImage, level: u8) -> GrayImage {
    map_pixels(img, |v| if v > level { 0 } else { FOREGROUND })
}

/// Locally thresholded binarization against a Gaussian-weighted mean.
///
/// A pixel becomes foreground when it is darker than its neighbourhood mean
/// by at least `offset`.
pub fn adaptive_threshold_inv(img: &GrayImage, block_size: usize, offset: f64) -> GrayImage {
    let mean = gaussian_blur(img, block_size, Border::Replicate);
    let delta = offset.floor() as i32;

    let mut out = GrayImage::new(img.width(), img.height());
    for ((dst, &src), &m) in out
        .iter_mut()
        .zip(img.as_raw().iter())
        .zip(mean.as_raw().iter())
    {
        *dst = if src as i32 - m as i32 <= -delta {
            FOREGROUND
        } else {
            0
        };
    }
    out
}

/// Stretch sample values linearly onto 0..=255
pub fn normalize_min_max(img: &GrayImage) -> GrayImage {
    let (min, max) = img
        .as_raw()
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let range = max as f64 - min as f64;
    let scale = if range > f64::EPSILON { 255.0 / range } else { 0.0 };
    let shift = -(min as f64) * scale;

    map_pixels(img, |v| saturate_half_even(v as f64 * scale + shift))
}

fn map_pixels(img: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    let mut out = img.clone();
    for v in out.iter_mut() {
        *v = f(*v);
    }
    out
}

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

/// Square-window min/max filter; pixels outside the image are ignored
fn rank_filter(img: &GrayImage, ksize: usize, extremum: Extremum) -> GrayImage {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let radius = ksize / 2;
    let src = img.as_raw();

    let pick = |a: u8, b: u8| match extremum {
        Extremum::Min => a.min(b),
        Extremum::Max => a.max(b),
    };
    let identity = match extremum {
        Extremum::Min => u8::MAX,
        Extremum::Max => u8::MIN,
    };

    let mut horizontal = vec![identity; w * h];
    for y in 0..h {
        for x in 0..w {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(w - 1);
            horizontal[y * w + x] = src[y * w + lo..=y * w + hi]
                .iter()
                .fold(identity, |acc, &v| pick(acc, v));
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(h - 1);
        for x in 0..w {
            let value = (lo..=hi).fold(identity, |acc, sy| pick(acc, horizontal[sy * w + x]));
            out.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }
    out
}

/// Grayscale erosion with a `ksize` x `ksize` all-ones element
pub fn erode(img: &GrayImage, ksize: usize) -> GrayImage {
    rank_filter(img, ksize, Extremum::Min)
}

/// Grayscale dilation with a `ksize` x `ksize` all-ones element
pub fn dilate(img: &GrayImage, ksize: usize) -> GrayImage {
    rank_filter(img, ksize, Extremum::Max)
}

/// Dilate then erode (bridges small gaps)
pub fn close(img: &GrayImage, ksize: usize) -> GrayImage {
    erode(&dilate(img, ksize), ksize)
}

/// Erode then dilate (removes speckle)
pub fn open(img: &GrayImage, ksize: usize) -> GrayImage {
    dilate(&erode(img, ksize), ksize)
}
