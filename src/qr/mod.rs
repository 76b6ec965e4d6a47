//! QR symbol encoding
//!
//! Turns a serialized payment record into a QR symbol and a PNG image. The
//! encoder enforces the symbol size ceiling of the payment standard.

mod encoder;

pub use encoder::{MAX_PNG_SIZE, MAX_SYMBOL_WIDTH, QrEncoder};
pub use qrcode::EcLevel;
