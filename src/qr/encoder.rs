//! QR code encoder

use crate::error::{Error, Result};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Widest symbol accepted for a payment code, in modules (version 14).
///
/// The 345 byte content ceiling needs version 14 under medium error correction
/// once the line breaks force byte mode.
pub const MAX_SYMBOL_WIDTH: usize = 73;

/// Largest requested image side in pixels
pub const MAX_PNG_SIZE: u32 = 4096;

/// QR code encoder
#[derive(Debug, Clone)]
pub struct QrEncoder {
    /// Error correction level
    ecc_level: EcLevel,
    /// Symbol width ceiling in modules
    max_width: usize,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings (Medium ECC, version 14 ceiling)
    pub fn new() -> Self {
        Self {
            ecc_level: EcLevel::M,
            max_width: MAX_SYMBOL_WIDTH,
        }
    }

    /// Create a new QR encoder with a specific error correction level
    pub fn with_ecc_level(ecc_level: EcLevel) -> Self {
        Self {
            ecc_level,
            ..Self::new()
        }
    }

    /// Override the symbol width ceiling
    pub fn max_width(mut self, modules: usize) -> Self {
        self.max_width = modules;
        self
    }

    /// Build the QR symbol, rejecting symbols above the width ceiling.
    pub fn symbol(&self, payload: &str) -> Result<QrCode> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ecc_level)?;

        let width = code.width();
        if width > self.max_width {
            return Err(Error::SymbolTooLarge { width });
        }
        tracing::debug!(width, version = ?code.version(), "Built QR symbol");

        Ok(code)
    }

    /// Encode text into a QR code image at least `size` pixels wide
    ///
    /// `size` must be within `1..=MAX_PNG_SIZE`.
    pub fn encode(&self, payload: &str, size: u32) -> Result<DynamicImage> {
        if size == 0 || size > MAX_PNG_SIZE {
            return Err(Error::InvalidImageSize);
        }
        let code = self.symbol(payload)?;

        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(size, size)
            .build();

        Ok(DynamicImage::ImageLuma8(image))
    }

    /// Encode text into a PNG byte stream
    pub fn encode_png(&self, payload: &str, size: u32) -> Result<Vec<u8>> {
        let image = self.encode(payload, size)?;

        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_png(png: &[u8]) -> String {
        let gray = image::load_from_memory(png).unwrap().to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(gray);
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1);
        let (_meta, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn test_encode_string() {
        let encoder = QrEncoder::new();
        let image = encoder.encode("Hello, MNB!", 256).unwrap();
        assert!(image.width() >= 256);
        assert_eq!(image.width(), image.height());
    }

    #[test]
    fn test_encode_png_signature() {
        let png = QrEncoder::new().encode_png("RTP\n001\n", 64).unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = QrEncoder::new().encode("data", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidImageSize));
    }

    #[test]
    fn test_size_ceiling() {
        let encoder = QrEncoder::new();
        let err = encoder.encode("data", MAX_PNG_SIZE + 1).unwrap_err();
        assert!(matches!(err, Error::InvalidImageSize));
        let err = encoder.encode_png("data", u32::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidImageSize));

        let image = encoder.encode("data", MAX_PNG_SIZE).unwrap();
        assert!(image.width() >= MAX_PNG_SIZE);
    }

    #[test]
    fn test_symbol_width_ceiling() {
        let encoder = QrEncoder::new().max_width(21);
        match encoder.symbol(&"x\n".repeat(100)) {
            Err(Error::SymbolTooLarge { width }) => assert!(width > 21),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(code) => panic!("symbol of width {} accepted", code.width()),
        }
        assert!(encoder.symbol("tiny").is_ok());
    }

    #[test]
    fn test_max_content_fits_default_ceiling() {
        let payload = format!("{}\n", "a".repeat(344));
        let code = QrEncoder::new().symbol(&payload).unwrap();
        assert!(code.width() <= MAX_SYMBOL_WIDTH);
    }

    #[test]
    fn test_oversized_payload_fails() {
        let encoder = QrEncoder::new();
        assert!(encoder.symbol(&"a\n".repeat(400)).is_err());
    }

    #[test]
    fn test_round_trip() {
        let original = "HCT\n001\n1\nGIBAHUHBXXX\nTest User\nHU00123456789012345678901234\nHUF10\n";
        let png = QrEncoder::new().encode_png(original, 400).unwrap();
        assert_eq!(decode_png(&png), original);
    }
}
