//! Error types for MNB QR operations

use thiserror::Error;

/// Result type alias using mnbqr's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for record validation, encoding and the outer facades
///
/// The `Display` text of every validation variant is the message shown to the
/// end user, so the CLI and HTTP facades print it verbatim.
#[derive(Error, Debug)]
pub enum Error {
    /// BIC is not 11 characters long (after extending an 8 character BIC)
    #[error("invalid BIC length")]
    InvalidBic,

    /// Name is longer than the allowed 70 characters
    #[error("name should not be longer than 70")]
    InvalidName,

    /// IBAN is not 28 characters long
    #[error("invalid IBAN length")]
    InvalidIban,

    /// A free-text field exceeds its maximum length
    #[error("{field} is too long")]
    FieldTooLong {
        /// Wire name of the offending field
        field: &'static str,
    },

    /// A text field contains a line break, which would shift the positional lines
    #[error("{field} should not contain line breaks")]
    LineBreak {
        /// Wire name of the offending field
        field: &'static str,
    },

    /// Version is not three ASCII digits
    #[error("version should be 3 digits")]
    InvalidVersion,

    /// Charset does not fit in a single digit
    #[error("charset should be a single digit")]
    InvalidCharset,

    /// Amount is below zero
    #[error("amount could not be negative")]
    NegativeAmount,

    /// Amount is above the 12 digit ceiling
    #[error("amount could not be higher than 999999999999")]
    AmountTooHigh,

    /// Validity timestamp is not in the future
    #[error("negative validity period")]
    ExpiredValidity,

    /// Purpose code is not 4 characters long
    #[error("purpose has invalid length")]
    InvalidPurposeLength,

    /// Purpose code is not in the ISO external purpose code list
    #[error("invalid purpose code")]
    InvalidPurposeCode,

    /// Unknown record kind
    #[error("invalid kind (should be RTP or HCT)")]
    InvalidKind,

    /// Serialized record does not fit the allowed content size
    #[error("qr content is too large")]
    PayloadTooLarge,

    /// Generated symbol is wider than the allowed module count
    #[error("generated QR code (width size) {width} is too high (content too big)")]
    SymbolTooLarge {
        /// Width of the generated symbol in modules
        width: usize,
    },

    /// Requested image size is zero or above the pixel ceiling
    #[error("invalid PNG size")]
    InvalidImageSize,

    /// QR code encoding failed
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed HTTP exchange
    #[error("HTTP error: {0}")]
    Http(String),

    /// HTTP request body above the configured limit
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(e: qrcode::types::QrError) -> Self {
        Error::QrEncode(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}
