// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterizer adapter — obtains the contract preview as one opaque bitmap.
//
// The engine does not render HTML itself; the embedding host owns a preview
// surface and hands its pixels over through `PreviewSource`. The driver here
// enforces the capture contract: locate before any work, prepare/restore
// strictly paired, transparency flattened before anything downstream sees
// the image.

use countersign_core::error::{CountersignError, Result};
use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, info, instrument};

/// A captured preview: the full scrollable extent of the contract at capture
/// time, opaque, in RGB.
#[derive(Debug, Clone)]
pub struct CapturedPreview {
    pub image: RgbImage,
    /// Device-pixel multiplier the source rendered at. Does not affect the
    /// mm mapping (it cancels out of the aspect ratio), only crispness.
    pub scale: f32,
}

/// A host-owned preview surface the pipeline can capture.
///
/// `locate` must fail fast when the surface does not exist; nothing else runs
/// in that case. `prepare` applies any capture-only layout overrides and
/// `restore` undoes them. The driver guarantees `restore` runs whenever
/// `prepare` was entered, on success and on failure alike.
pub trait PreviewSource {
    fn locate(&mut self) -> Result<()>;
    fn prepare(&mut self) -> Result<()>;
    fn capture(&mut self, scale: f32) -> Result<DynamicImage>;
    fn restore(&mut self);
}

struct RestoreOnDrop<'a>(&'a mut dyn PreviewSource);

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        self.0.restore();
    }
}

/// Capture the preview at the given scale (device pixels per CSS pixel,
/// must be >= 1) and flatten it onto an opaque white background.
#[instrument(skip(source))]
pub fn capture_preview(source: &mut dyn PreviewSource, scale: f32) -> Result<CapturedPreview> {
    if !scale.is_finite() || scale < 1.0 {
        return Err(CountersignError::Capture(format!(
            "capture scale must be >= 1, got {scale}"
        )));
    }

    source.locate()?;

    let dynamic = {
        let mut guard = RestoreOnDrop(source);
        guard.0.prepare()?;
        guard.0.capture(scale)?
        // guard drops here, restoring the source before flattening begins
    };

    let image = flatten_onto_white(&dynamic);
    info!(
        width = image.width(),
        height = image.height(),
        scale,
        "Preview captured"
    );
    Ok(CapturedPreview { image, scale })
}

/// Composite any transparency onto white, producing an opaque RGB bitmap.
pub(crate) fn flatten_onto_white(dynamic: &DynamicImage) -> RgbImage {
    let rgba = dynamic.to_rgba8();
    let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = a as f32 / 255.0;
        let blend = |channel: u8| -> u8 {
            (channel as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    });
    debug!("Preview flattened onto white");
    flattened
}

/// A preview source wrapping an already-rendered bitmap.
///
/// This is what an embedding host constructs after performing its own DOM
/// capture; it also serves as the reference implementation of the
/// prepare/restore contract.
pub struct StaticPreview {
    image: Option<DynamicImage>,
    pub prepared: bool,
    pub restored: bool,
}

impl StaticPreview {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Some(image),
            prepared: false,
            restored: false,
        }
    }

    /// A source with no surface at all; `locate` fails.
    pub fn missing() -> Self {
        Self {
            image: None,
            prepared: false,
            restored: false,
        }
    }
}

impl PreviewSource for StaticPreview {
    fn locate(&mut self) -> Result<()> {
        if self.image.is_some() {
            Ok(())
        } else {
            Err(CountersignError::PreviewMissing(
                "no preview bitmap attached".into(),
            ))
        }
    }

    fn prepare(&mut self) -> Result<()> {
        self.prepared = true;
        Ok(())
    }

    // The bitmap is already rendered, so the requested scale is whatever the
    // host rendered at; the parameter is ignored here.
    fn capture(&mut self, _scale: f32) -> Result<DynamicImage> {
        self.image
            .clone()
            .ok_or_else(|| CountersignError::Capture("preview bitmap went away".into()))
    }

    fn restore(&mut self) {
        self.restored = true;
        self.prepared = false;
    }
}
