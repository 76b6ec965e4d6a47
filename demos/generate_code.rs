//! Generate a credit transfer QR code and save it to a file
//!
//! Usage: cargo run --example generate_code

use chrono::{Duration, Utc};
use mnbqr::Record;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut record = Record::new_send("GIBAHUHB", "Test User", "HU00123456789012345678901234")?;
    record.set_huf_amount(10)?;
    record.set_message("Lunch")?;
    record.set_valid_until(Utc::now() + Duration::hours(2))?;

    println!("{}", record.serialize());

    let png = record.generate_png(256)?;
    std::fs::write("out.png", &png)?;
    println!("✓ Payment QR code saved to out.png ({} bytes)", png.len());

    Ok(())
}
