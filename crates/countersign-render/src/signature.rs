// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signature conditioning — cleans up bitmaps captured from a pointer canvas.
//
// Flattens transparency onto white, softens capture aliasing with a light
// blur, and trims the blank border around the ink. Cosmetic only: every
// failure path returns the original bytes unchanged.

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument, warn};

use crate::preview::flatten_onto_white;

const BLUR_SIGMA: f32 = 0.8;
/// Luminance above this counts as background, not ink.
const INK_THRESHOLD: f32 = 245.0;
const TRIM_PADDING_PX: u32 = 8;

/// Condition a captured signature PNG. Never fails; if anything goes wrong
/// the original bytes come back.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn prepare_signature(bytes: &[u8]) -> Vec<u8> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(err) => {
            warn!(error = %err, "Signature bytes failed to decode; keeping original");
            return bytes.to_vec();
        }
    };

    let flattened = flatten_onto_white(&decoded);
    let softened = gaussian_blur_f32(&flattened, BLUR_SIGMA);

    let Some((x0, y0, x1, y1)) = ink_bounding_box(&softened) else {
        debug!("No ink found on signature canvas; keeping original");
        return bytes.to_vec();
    };

    let (w, h) = softened.dimensions();
    let left = x0.saturating_sub(TRIM_PADDING_PX);
    let top = y0.saturating_sub(TRIM_PADDING_PX);
    let right = (x1 + TRIM_PADDING_PX + 1).min(w);
    let bottom = (y1 + TRIM_PADDING_PX + 1).min(h);

    let trimmed =
        image::imageops::crop_imm(&softened, left, top, right - left, bottom - top).to_image();

    let mut out = Vec::new();
    let encode = image::DynamicImage::ImageRgb8(trimmed)
        .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png);
    match encode {
        Ok(()) => {
            debug!(
                from = bytes.len(),
                to = out.len(),
                "Signature conditioned"
            );
            out
        }
        Err(err) => {
            warn!(error = %err, "Signature re-encode failed; keeping original");
            bytes.to_vec()
        }
    }
}

/// Inclusive bounding box of all pixels darker than the ink threshold.
fn ink_bounding_box(image: &RgbImage) -> Option<(u32, u32, u32, u32)> {
    let mut bbox: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        let Rgb([r, g, b]) = *pixel;
        let luminance = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        if luminance < INK_THRESHOLD {
            bbox = Some(match bbox {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }

    bbox
}
