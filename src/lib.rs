//! MNBQR - Hungarian instant payment QR code generator
//!
//! This library builds the text record embedded in the QR codes of the
//! Hungarian instant payment system and encodes it into a PNG image.
//!
//! # Features
//!
//! - **Record model**: validating setters for every field of a payment code
//! - **Positional format**: deterministic 17 line serialization with defaults
//! - **Encoding gate**: expiry and size checks before the symbol is built
//! - **HTTP facade**: one-shot JSON to PNG endpoint (`server` feature)
//!
//! # Example
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use mnbqr::Record;
//!
//! fn main() -> mnbqr::Result<()> {
//!     let mut record = Record::new_send("GIBAHUHB", "Test User", "HU00123456789012345678901234")?;
//!     record.set_huf_amount(1500)?;
//!     record.set_purpose("rent")?;
//!     record.set_valid_until(Utc::now() + Duration::hours(2))?;
//!
//!     println!("{}", record.serialize());
//!     let png = record.generate_png(256)?;
//!     std::fs::write("out.png", png)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod qr;
pub mod record;

#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub mod server;

// Re-exports for convenience
pub use error::{Error, Result};

pub use config::{LogRotation, LoggingOptions, MnbQrConfig, OutputOptions, ServerOptions};
pub use qr::QrEncoder;
pub use record::{Amount, Kind, MAX_CONTENT_SIZE, Record, ValidityDate};
