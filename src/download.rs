//! Size-capped, decode-verified downloader for a single chosen candidate.

use crate::config::ScrapingConfig;
use crate::models::RawImage;
use crate::ratelimit::RateLimiter;
use crate::sources::{build_agent, get_with_browser_headers, redact_url_for_log};
use std::io::Read;
use tracing::{debug, warn};

pub struct Downloader {
    agent: ureq::Agent,
    config: ScrapingConfig,
    limiter: RateLimiter,
    max_bytes: u64,
}

impl Downloader {
    pub fn new(config: &ScrapingConfig) -> Self {
        Self {
            agent: build_agent(config.download_timeout()),
            config: config.clone(),
            limiter: RateLimiter::new(config.scraping_delay()),
            max_bytes: config.max_file_size_bytes(),
        }
    }

    /// Fetches one URL and returns its bytes only if they decode as a real
    /// raster image within the size cap. Every failure mode (bad scheme,
    /// HTTP error, timeout, oversized payload, non-image bytes) logs and
    /// returns `None`; retry policy belongs to the caller.
    pub fn download(&mut self, url: &str) -> Option<RawImage> {
        let lower = url.trim().to_ascii_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            warn!(url = %redact_url_for_log(url), "refusing non-http(s) download");
            return None;
        }

        self.limiter.wait();
        let mut response = match get_with_browser_headers(&self.agent, url, &self.config) {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %redact_url_for_log(url), %err, "download request failed");
                return None;
            }
        };

        let status = response.status().as_u16();
        if status >= 400 {
            warn!(url = %redact_url_for_log(url), status, "download returned error status");
            return None;
        }

        let declared = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if exceeds_size_cap(declared, self.max_bytes) {
            warn!(
                url = %redact_url_for_log(url),
                declared = declared.unwrap_or(0),
                cap = self.max_bytes,
                "declared payload exceeds size cap, skipping body"
            );
            return None;
        }

        // Read one byte past the cap so an undeclared oversize is caught.
        let mut data = Vec::new();
        if response
            .body_mut()
            .as_reader()
            .take(self.max_bytes + 1)
            .read_to_end(&mut data)
            .is_err()
        {
            warn!(url = %redact_url_for_log(url), "failed to read download body");
            return None;
        }
        if data.len() as u64 > self.max_bytes {
            warn!(
                url = %redact_url_for_log(url),
                cap = self.max_bytes,
                "streamed payload exceeds size cap"
            );
            return None;
        }
        if data.is_empty() {
            warn!(url = %redact_url_for_log(url), "empty download body");
            return None;
        }

        match decode_verified(&data) {
            Some(raw) => {
                debug!(
                    url = %redact_url_for_log(url),
                    bytes = raw.data.len(),
                    format = ?raw.format,
                    "download verified"
                );
                Some(raw)
            }
            None => {
                warn!(
                    url = %redact_url_for_log(url),
                    bytes = data.len(),
                    "payload does not decode as an image"
                );
                None
            }
        }
    }
}

pub(crate) fn exceeds_size_cap(declared: Option<u64>, max_bytes: u64) -> bool {
    declared.map(|length| length > max_bytes).unwrap_or(false)
}

/// Full decode, not just a magic-byte sniff: hostile payloads routinely
/// carry an image header in front of junk.
pub(crate) fn decode_verified(data: &[u8]) -> Option<RawImage> {
    let format = image::guess_format(data).ok()?;
    image::load_from_memory_with_format(data, format).ok()?;
    Some(RawImage {
        data: data.to_vec(),
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([120, 90, 60]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .expect("encode");
        buf.into_inner()
    }

    #[test]
    fn declared_length_over_cap_is_rejected_before_body_read() {
        let cap = 5 * 1024 * 1024;
        assert!(exceeds_size_cap(Some(cap + 1), cap));
        assert!(!exceeds_size_cap(Some(cap), cap));
        // No declared length: the streaming gate decides instead.
        assert!(!exceeds_size_cap(None, cap));
    }

    #[test]
    fn html_error_pages_do_not_decode_as_images() {
        let body = b"<html><head><title>404</title></head><body>not here</body></html>";
        assert!(decode_verified(body).is_none());
    }

    #[test]
    fn truncated_image_payloads_are_rejected() {
        let mut png = encoded_png(64, 64);
        png.truncate(png.len() / 2);
        assert!(decode_verified(&png).is_none());
    }

    #[test]
    fn valid_payloads_keep_bytes_and_report_the_format() {
        let png = encoded_png(64, 64);
        let raw = decode_verified(&png).expect("valid image");
        assert_eq!(raw.format, ImageFormat::Png);
        assert_eq!(raw.data, png);
    }
}
