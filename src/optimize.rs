//! Re-encodes a downloaded image for embedding: RGB on white, downscaled
//! to the document type's bounding box, JPEG at a fixed quality. No I/O.

use crate::models::DocType;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, warn};

const JPEG_QUALITY: u8 = 85;

/// Decode, normalize, bound, re-encode. Returns `None` on any decode or
/// encode failure so the caller can fall back to the unoptimized original.
/// Images already within the bound keep their dimensions; upscaling never
/// happens.
pub fn optimize_for_document(data: &[u8], doc_type: DocType) -> Option<Vec<u8>> {
    let decoded = match image::load_from_memory(data) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(%err, "optimize: payload failed to decode");
            return None;
        }
    };

    let rgb = flatten_to_rgb(&decoded);
    let (max_width, max_height) = doc_type.bounds();
    let bounded = if rgb.width() > max_width || rgb.height() > max_height {
        DynamicImage::ImageRgb8(rgb)
            .resize(max_width, max_height, FilterType::Lanczos3)
            .to_rgb8()
    } else {
        rgb
    };

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    if let Err(err) = encoder.encode_image(&bounded) {
        warn!(%err, "optimize: JPEG encode failed");
        return None;
    }

    debug!(
        input_bytes = data.len(),
        output_bytes = out.len(),
        width = bounded.width(),
        height = bounded.height(),
        "image optimized"
    );
    Some(out)
}

/// JPEG has no alpha channel; composite transparency onto white so
/// re-encoding never produces corrupted color.
fn flatten_to_rgb(decoded: &DynamicImage) -> RgbImage {
    if !decoded.color().has_alpha() {
        return decoded.to_rgb8();
    }

    let rgba = decoded.to_rgba8();
    let mut out = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend =
            |channel: u8| (((channel as u32) * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    out
}
