//! Fingerprint Vault - Image Decoding
//!
//! Raw scan bytes to a single-channel 8-bit grid.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use crate::error::{FingerprintError, FpResult};

/// Fixed-point luma weights (14-bit) applied to channels 0, 1, 2 in that order.
///
/// Channel 0 carries the 0.114 weight, channel 2 the 0.299 weight. For an RGB
/// source this weights blue as red and red as blue; stored digests were made
/// this way, so it stays.
const LUMA_WEIGHTS: [u32; 3] = [1868, 9617, 4899];
const LUMA_SHIFT: u32 = 14;

/// Decode an encoded raster image (PNG, JPEG, BMP, ...) into grayscale
pub fn decode_grayscale(bytes: &[u8]) -> FpResult<GrayImage> {
    if bytes.is_empty() {
        return Err(FingerprintError::ImageDecode("empty input".into()));
    }

    let img = image::load_from_memory(bytes)?;

    if img.width() == 0 || img.height() == 0 {
        return Err(FingerprintError::ImageDecode(format!(
            "degenerate image {}x{}",
            img.width(),
            img.height()
        )));
    }

    if let Some(indices) = png_palette_indices(bytes)? {
        return Ok(indices);
    }

    Ok(to_grayscale(&img))
}

/// Palette PNGs keep their raw indices as the gray value; the palette colours
/// are never looked at. `None` for any other image.
fn png_palette_indices(bytes: &[u8]) -> FpResult<Option<GrayImage>> {
    if image::guess_format(bytes).ok() != Some(ImageFormat::Png) {
        return Ok(None);
    }

    let png_err = |e: png::DecodingError| FingerprintError::ImageDecode(e.to_string());

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().map_err(png_err)?;
    if reader.info().color_type != png::ColorType::Indexed {
        return Ok(None);
    }

    let mut buffer = vec![0u8; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buffer).map_err(png_err)?;

    // Indexed samples are 1, 2, 4 or 8 bits, packed MSB first
    let bits = frame.bit_depth as usize;
    let per_byte = 8 / bits;
    let mask = ((1u16 << bits) - 1) as u8;

    Ok(Some(GrayImage::from_fn(frame.width, frame.height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let byte = buffer[y * frame.line_size + x / per_byte];
        let shift = 8 - bits * (x % per_byte + 1);
        Luma([(byte >> shift) & mask])
    })))
}

/// Collapse a decoded image to one channel
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    if img.color().channel_count() < 3 {
        return img.to_luma8();
    }

    let rgb = img.to_rgb8();
    let round = 1u32 << (LUMA_SHIFT - 1);

    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let px = rgb.get_pixel(x, y).0;
        let sum = px[0] as u32 * LUMA_WEIGHTS[0]
            + px[1] as u32 * LUMA_WEIGHTS[1]
            + px[2] as u32 * LUMA_WEIGHTS[2];
        Luma([((sum + round) >> LUMA_SHIFT) as u8])
    })
}
