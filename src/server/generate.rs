//! `POST /` handler: JSON request in, PNG payment code out

use super::HttpResponse;
use crate::error::{Error, Result};
use crate::qr::MAX_PNG_SIZE;
use crate::record::{Kind, Record};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// JSON body of a generate request; every field is optional on the wire
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    /// `HCT` or `RTP`
    pub kind: String,
    /// Bank identifier, 8 or 11 characters
    pub bic: String,
    /// Account holder name
    pub name: String,
    /// Account number
    pub iban: String,
    /// Validity window in seconds from now
    pub expire: i64,
    /// Minimum PNG size in pixels
    #[serde(rename = "pngSize")]
    pub png_size: u32,
    /// Amount in HUF, ignored unless positive
    pub amount: i64,
    /// ISO purpose code, ignored when empty
    pub purpose: String,
    /// Free-text message
    pub message: String,
    /// Shop id
    #[serde(rename = "shopID")]
    pub shop_id: String,
    /// Merchant device id
    #[serde(rename = "merchDevID")]
    pub merch_dev_id: String,
    /// Invoice id
    #[serde(rename = "invoiceID")]
    pub invoice_id: String,
    /// Customer id
    #[serde(rename = "customerID")]
    pub customer_id: String,
    /// Credit transfer id
    #[serde(rename = "credTranID")]
    pub cred_tran_id: String,
    /// Loyalty id
    #[serde(rename = "loyaltyID")]
    pub loyalty_id: String,
    /// NAV check id
    #[serde(rename = "navCheckID")]
    pub nav_check_id: String,
}

type TextSetter = fn(&mut Record, &str) -> Result<()>;

impl GenerateRequest {
    /// Build a record from the request, stopping at the first rejected field.
    pub fn build_record(&self, now: DateTime<Utc>) -> Result<Record> {
        let kind: Kind = self.kind.parse()?;
        let mut record = Record::with_recipient(kind, &self.bic, &self.name, &self.iban)?;

        let valid_until = Duration::try_seconds(self.expire)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| Error::Other("expire is out of range".to_string()))?;
        record.set_valid_until(valid_until)?;

        if self.amount > 0 {
            record.set_huf_amount(self.amount)?;
        }
        if !self.purpose.is_empty() {
            record.set_purpose(&self.purpose)?;
        }

        let text_fields: [(&str, TextSetter); 8] = [
            (&self.message, Record::set_message),
            (&self.shop_id, Record::set_shop_id),
            (&self.merch_dev_id, Record::set_merch_dev_id),
            (&self.invoice_id, Record::set_invoice_id),
            (&self.customer_id, Record::set_customer_id),
            (&self.cred_tran_id, Record::set_cred_tran_id),
            (&self.loyalty_id, Record::set_loyalty_id),
            (&self.nav_check_id, Record::set_nav_check_id),
        ];
        for (value, setter) in text_fields {
            setter(&mut record, value)?;
        }

        Ok(record)
    }
}

/// Turn one HTTP request into its response.
pub fn handle(method: &str, body: &[u8]) -> HttpResponse {
    if method != "POST" {
        return HttpResponse::error(405, "invalid method");
    }

    let request: GenerateRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => return HttpResponse::error(400, &err.to_string()),
    };

    match generate(&request) {
        Ok(png) => {
            tracing::info!(kind = %request.kind, bytes = png.len(), "Generated payment code");
            HttpResponse::png(png)
        }
        Err(err) => {
            tracing::info!(error = %err, "Rejected generate request");
            HttpResponse::error(400, &err.to_string())
        }
    }
}

fn generate(request: &GenerateRequest) -> Result<Vec<u8>> {
    if request.png_size == 0 || request.png_size > MAX_PNG_SIZE {
        return Err(Error::InvalidImageSize);
    }
    let record = request.build_record(Utc::now())?;
    record.generate_png(request.png_size)
}
