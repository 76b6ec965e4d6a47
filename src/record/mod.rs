//! Payment record model of the Hungarian instant payment QR code
//!
//! A [`Record`] holds every field of one code. Fields are only changed through
//! validating setters, so a record never carries a value the standard rejects.
//! [`Record::serialize`] renders the positional, newline separated text that is
//! embedded into the QR symbol, and [`Record::generate_png`] gates and encodes it.

pub mod date;
pub mod purpose;

pub use date::ValidityDate;

use crate::error::{Error, Result};
use crate::qr::QrEncoder;
use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Maximum size in bytes of the serialized record accepted for encoding
pub const MAX_CONTENT_SIZE: usize = 345;

/// Largest amount the 12 digit amount field can carry
pub const MAX_AMOUNT: i64 = 999_999_999_999;

const DEFAULT_VERSION: &str = "001";
const DEFAULT_CHARSET: u8 = 1;
const DEFAULT_CURRENCY: &str = "HUF";

const BIC_LEN: usize = 11;
const SHORT_BIC_LEN: usize = 8;
const IBAN_LEN: usize = 28;
const MAX_NAME_LEN: usize = 70;
const MAX_MESSAGE_LEN: usize = 70;
const MAX_REFERENCE_LEN: usize = 35;
const PURPOSE_LEN: usize = 4;

/// Which party generates the code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Payee generated code; the scanner sends the money (`HCT`)
    Send,
    /// Payer generated code; the scanner sends a request to pay (`RTP`)
    Request,
}

impl Kind {
    /// Three letter code written on the first line
    pub fn code(self) -> &'static str {
        match self {
            Kind::Send => "HCT",
            Kind::Request => "RTP",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "HCT" => Ok(Kind::Send),
            "RTP" => Ok(Kind::Request),
            _ => Err(Error::InvalidKind),
        }
    }
}

/// Optional payment amount
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Amount {
    currency: String,
    total: i64,
}

impl Amount {
    /// Amount in Hungarian forint, range checked
    pub fn huf(total: i64) -> Result<Self> {
        if total < 0 {
            return Err(Error::NegativeAmount);
        }
        if total > MAX_AMOUNT {
            return Err(Error::AmountTooHigh);
        }
        Ok(Self {
            currency: DEFAULT_CURRENCY.to_string(),
            total,
        })
    }

    /// Currency code, `HUF` when unset
    pub fn currency(&self) -> &str {
        if self.currency.is_empty() {
            DEFAULT_CURRENCY
        } else {
            &self.currency
        }
    }

    /// Integer total
    pub fn total(&self) -> i64 {
        self.total
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency(), self.total)
    }
}

/// One payment QR code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    kind: Kind,
    version: String,
    charset: u8,
    bic: String,
    name: String,
    iban: String,
    amount: Amount,
    valid_until: Option<ValidityDate>,
    purpose: String,
    message: String,
    shop_id: String,
    merch_dev_id: String,
    invoice_id: String,
    customer_id: String,
    cred_tran_id: String,
    loyalty_id: String,
    nav_check_id: String,
}

impl Record {
    /// Code that makes the scanner send the payment to the generator (`HCT`).
    pub fn new_send(bic: &str, name: &str, iban: &str) -> Result<Self> {
        Self::with_recipient(Kind::Send, bic, name, iban)
    }

    /// Code that makes the scanner send a request to pay to the generator (`RTP`).
    pub fn new_request(bic: &str, name: &str, iban: &str) -> Result<Self> {
        Self::with_recipient(Kind::Request, bic, name, iban)
    }

    /// Build a record of the given kind; checks run BIC, name, IBAN and stop at the first failure.
    pub fn with_recipient(kind: Kind, bic: &str, name: &str, iban: &str) -> Result<Self> {
        let mut bic = bic.to_string();
        // SEPA: 8 character BICs are extended to 11
        if char_len(&bic) == SHORT_BIC_LEN {
            bic.push_str("XXX");
        }
        if char_len(&bic) != BIC_LEN {
            return Err(Error::InvalidBic);
        }
        if char_len(name) > MAX_NAME_LEN {
            return Err(Error::InvalidName);
        }
        if has_line_break(name) {
            return Err(Error::LineBreak { field: "name" });
        }
        if char_len(iban) != IBAN_LEN {
            return Err(Error::InvalidIban);
        }

        Ok(Self {
            kind,
            version: String::new(),
            charset: 0,
            bic,
            name: name.to_string(),
            iban: iban.to_string(),
            amount: Amount::default(),
            valid_until: None,
            purpose: String::new(),
            message: String::new(),
            shop_id: String::new(),
            merch_dev_id: String::new(),
            invoice_id: String::new(),
            customer_id: String::new(),
            cred_tran_id: String::new(),
            loyalty_id: String::new(),
            nav_check_id: String::new(),
        })
    }

    /// Set the format version, three ASCII digits.
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        if version.len() != 3 || !version.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidVersion);
        }
        self.version = version.to_string();
        Ok(())
    }

    /// Set the character set id; `0` restores the default.
    pub fn set_charset(&mut self, charset: u8) -> Result<()> {
        if charset > 9 {
            return Err(Error::InvalidCharset);
        }
        self.charset = charset;
        Ok(())
    }

    /// Set the amount in forint. Zero clears the amount line.
    pub fn set_huf_amount(&mut self, total: i64) -> Result<()> {
        self.amount = Amount::huf(total)?;
        Ok(())
    }

    /// Set the validity deadline, which must be in the future.
    pub fn set_valid_until<Tz: TimeZone>(&mut self, at: DateTime<Tz>) -> Result<()> {
        self.set_valid_until_at(&at, Utc::now())
    }

    fn set_valid_until_at<Tz: TimeZone>(
        &mut self,
        at: &DateTime<Tz>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let date = ValidityDate::new(at);
        if is_expired(&date, now) {
            return Err(Error::ExpiredValidity);
        }
        self.valid_until = Some(date);
        Ok(())
    }

    /// Set the ISO purpose code; input is case-insensitive.
    pub fn set_purpose(&mut self, purpose: &str) -> Result<()> {
        if char_len(purpose) != PURPOSE_LEN {
            return Err(Error::InvalidPurposeLength);
        }
        let code = purpose.to_uppercase();
        if !purpose::is_known(&code) {
            return Err(Error::InvalidPurposeCode);
        }
        self.purpose = code;
        Ok(())
    }

    /// Set the free-text message shown to the payer.
    pub fn set_message(&mut self, message: &str) -> Result<()> {
        set_text(&mut self.message, "message", MAX_MESSAGE_LEN, message)
    }

    /// Set the shop id.
    pub fn set_shop_id(&mut self, value: &str) -> Result<()> {
        set_text(&mut self.shop_id, "shopID", MAX_REFERENCE_LEN, value)
    }

    /// Set the merchant device id.
    pub fn set_merch_dev_id(&mut self, value: &str) -> Result<()> {
        set_text(&mut self.merch_dev_id, "merchDevID", MAX_REFERENCE_LEN, value)
    }

    /// Set the invoice id.
    pub fn set_invoice_id(&mut self, value: &str) -> Result<()> {
        set_text(&mut self.invoice_id, "invoiceID", MAX_REFERENCE_LEN, value)
    }

    /// Set the customer id.
    pub fn set_customer_id(&mut self, value: &str) -> Result<()> {
        set_text(&mut self.customer_id, "customerID", MAX_REFERENCE_LEN, value)
    }

    /// Set the credit transfer id.
    pub fn set_cred_tran_id(&mut self, value: &str) -> Result<()> {
        set_text(&mut self.cred_tran_id, "credTranID", MAX_REFERENCE_LEN, value)
    }

    /// Set the loyalty id.
    pub fn set_loyalty_id(&mut self, value: &str) -> Result<()> {
        set_text(&mut self.loyalty_id, "loyaltyID", MAX_REFERENCE_LEN, value)
    }

    /// Set the NAV (tax authority) check id.
    pub fn set_nav_check_id(&mut self, value: &str) -> Result<()> {
        set_text(&mut self.nav_check_id, "navCheckID", MAX_REFERENCE_LEN, value)
    }

    /// Record kind
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Format version, `001` when unset
    pub fn version(&self) -> &str {
        if self.version.is_empty() {
            DEFAULT_VERSION
        } else {
            &self.version
        }
    }

    /// Character set id, `1` when unset
    pub fn charset(&self) -> u8 {
        if self.charset == 0 {
            DEFAULT_CHARSET
        } else {
            self.charset
        }
    }

    /// Normalized 11 character BIC
    pub fn bic(&self) -> &str {
        &self.bic
    }

    /// Account holder name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Account number
    pub fn iban(&self) -> &str {
        &self.iban
    }

    /// Amount; a zero total is not serialized
    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    /// Explicitly set validity deadline
    pub fn valid_until(&self) -> Option<ValidityDate> {
        self.valid_until
    }

    /// Upper-case purpose code, empty when unset
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    /// Message, empty when unset
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shop id, empty when unset
    pub fn shop_id(&self) -> &str {
        &self.shop_id
    }

    /// Merchant device id, empty when unset
    pub fn merch_dev_id(&self) -> &str {
        &self.merch_dev_id
    }

    /// Invoice id, empty when unset
    pub fn invoice_id(&self) -> &str {
        &self.invoice_id
    }

    /// Customer id, empty when unset
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Credit transfer id, empty when unset
    pub fn cred_tran_id(&self) -> &str {
        &self.cred_tran_id
    }

    /// Loyalty id, empty when unset
    pub fn loyalty_id(&self) -> &str {
        &self.loyalty_id
    }

    /// NAV check id, empty when unset
    pub fn nav_check_id(&self) -> &str {
        &self.nav_check_id
    }

    /// Render the 17 newline terminated lines embedded into the QR symbol.
    ///
    /// An unset validity is replaced by one hour from now.
    pub fn serialize(&self) -> String {
        self.render(Local::now().into())
    }

    fn render(&self, now: DateTime<FixedOffset>) -> String {
        let charset = self.charset().to_string();
        let amount = if self.amount.total > 0 {
            self.amount.to_string()
        } else {
            String::new()
        };
        let valid_until = self
            .valid_until
            .unwrap_or_else(|| ValidityDate::new(&(now + Duration::hours(1))))
            .to_string();

        // Positional format: the order of these lines is the wire format.
        let lines: [&str; 17] = [
            self.kind.code(),
            self.version(),
            &charset,
            &self.bic,
            &self.name,
            &self.iban,
            &amount,
            &valid_until,
            &self.purpose,
            &self.message,
            &self.shop_id,
            &self.merch_dev_id,
            &self.invoice_id,
            &self.customer_id,
            &self.cred_tran_id,
            &self.loyalty_id,
            &self.nav_check_id,
        ];

        let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Serialize the record after checking that it may be encoded right now.
    ///
    /// Fails with [`Error::ExpiredValidity`] when the validity is unset or has
    /// passed, and with [`Error::PayloadTooLarge`] above [`MAX_CONTENT_SIZE`].
    pub fn encodable_payload(&self) -> Result<String> {
        self.encodable_payload_at(Utc::now())
    }

    fn encodable_payload_at(&self, now: DateTime<Utc>) -> Result<String> {
        match &self.valid_until {
            Some(date) if !is_expired(date, now) => {}
            _ => return Err(Error::ExpiredValidity),
        }

        let payload = self.render(now.into());
        if payload.len() > MAX_CONTENT_SIZE {
            return Err(Error::PayloadTooLarge);
        }
        Ok(payload)
    }

    /// Encode the record as a PNG QR code of at least `size` pixels square.
    pub fn generate_png(&self, size: u32) -> Result<Vec<u8>> {
        self.generate_png_with(&QrEncoder::new(), size)
    }

    /// Encode the record as a PNG QR code using a caller supplied encoder.
    pub fn generate_png_with(&self, encoder: &QrEncoder, size: u32) -> Result<Vec<u8>> {
        let payload = self.encodable_payload()?;
        tracing::debug!(
            kind = %self.kind,
            payload_bytes = payload.len(),
            size,
            "Encoding payment record"
        );
        encoder.encode_png(&payload, size)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

fn is_expired(date: &ValidityDate, now: DateTime<Utc>) -> bool {
    date.as_datetime().with_timezone(&Utc) <= now
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

// Every field is one line of the payload
fn has_line_break(value: &str) -> bool {
    value.contains(['\n', '\r'])
}

fn set_text(slot: &mut String, field: &'static str, max_len: usize, value: &str) -> Result<()> {
    if char_len(value) > max_len {
        return Err(Error::FieldTooLong { field });
    }
    if has_line_break(value) {
        return Err(Error::LineBreak { field });
    }
    *slot = value.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIC: &str = "abcdefgh";
    const IBAN: &str = "HU00123456789012345678901234";

    fn request() -> Record {
        Record::new_request(BIC, "Test User", IBAN).unwrap()
    }

    fn full_record() -> Record {
        let mut record = Record::new_send("abcdefghijk", &"a".repeat(70), IBAN).unwrap();
        record.set_huf_amount(MAX_AMOUNT).unwrap();
        record
            .set_valid_until(Utc::now() + Duration::hours(2))
            .unwrap();
        record.set_purpose("acct").unwrap();
        record.set_message(&"m".repeat(70)).unwrap();
        record.set_shop_id(&"s".repeat(35)).unwrap();
        record.set_merch_dev_id(&"d".repeat(35)).unwrap();
        record.set_invoice_id(&"i".repeat(35)).unwrap();
        record.set_customer_id(&"c".repeat(35)).unwrap();
        record.set_cred_tran_id(&"t".repeat(35)).unwrap();
        record.set_loyalty_id(&"l".repeat(35)).unwrap();
        record.set_nav_check_id(&"n".repeat(35)).unwrap();
        record
    }

    #[test]
    fn test_huf_amount() {
        let mut record = request();
        assert_eq!(record.amount().to_string(), "HUF0");

        record.set_huf_amount(100).unwrap();
        assert_eq!(record.amount().to_string(), "HUF100");

        record.set_huf_amount(MAX_AMOUNT).unwrap();
        assert_eq!(record.amount().to_string(), "HUF999999999999");
    }

    #[test]
    fn test_huf_amount_bounds() {
        let mut record = request();
        record.set_huf_amount(500).unwrap();

        let err = record.set_huf_amount(-1).unwrap_err();
        assert_eq!(err.to_string(), "amount could not be negative");
        let err = record.set_huf_amount(1_234_567_890_123).unwrap_err();
        assert_eq!(err.to_string(), "amount could not be higher than 999999999999");

        // Rejected values leave the previous amount in place
        assert_eq!(record.amount().total(), 500);
    }

    #[test]
    fn test_recipient_checks() {
        let name70 = "a".repeat(70);
        let name71 = "a".repeat(71);
        let cases: &[(&str, &str, &str, Option<&str>)] = &[
            ("a", "", "", Some("invalid BIC length")),
            ("abcdefgh", "", IBAN, None),
            ("abcdefghi", "", "", Some("invalid BIC length")),
            ("abcdefghijk", "", IBAN, None),
            ("abcdefghijke", "", "", Some("invalid BIC length")),
            ("abcdefghijk", "Test User", IBAN, None),
            ("abcdefghijk", name70.as_str(), IBAN, None),
            (
                "abcdefghijk",
                name71.as_str(),
                "",
                Some("name should not be longer than 70"),
            ),
            (
                "abcdefghijk",
                "Test User",
                "HU0012345678901234567890123",
                Some("invalid IBAN length"),
            ),
            (
                "abcdefghijk",
                "Test User",
                "HU001234567890123456789012345",
                Some("invalid IBAN length"),
            ),
        ];

        for (bic, name, iban, expected) in cases {
            let result = Record::new_send(bic, name, iban);
            match expected {
                Some(message) => {
                    assert_eq!(result.unwrap_err().to_string(), *message, "{bic}/{iban}")
                }
                None => assert!(result.is_ok(), "{bic}/{iban}"),
            }
        }
    }

    #[test]
    fn test_recipient_check_order() {
        // Every field is wrong; BIC is reported first
        let err = Record::new_send("x", &"a".repeat(71), "short").unwrap_err();
        assert!(matches!(err, Error::InvalidBic));
        let err = Record::new_send("abcdefgh", &"a".repeat(71), "short").unwrap_err();
        assert!(matches!(err, Error::InvalidName));
    }

    #[test]
    fn test_short_bic_is_extended() {
        for bic in ["abcdefgh", "GIBAHUHB", "12345678"] {
            let record = Record::new_send(bic, "Test User", IBAN).unwrap();
            assert_eq!(record.bic(), format!("{bic}XXX"));
        }

        let record = request();
        assert_eq!(record.bic(), "abcdefghXXX");
        assert_eq!(record.name(), "Test User");
        assert_eq!(record.iban(), IBAN);
        assert_eq!(record.kind(), Kind::Request);
    }

    #[test]
    fn test_purpose() {
        let mut record = request();
        assert!(matches!(
            record.set_purpose("a").unwrap_err(),
            Error::InvalidPurposeLength
        ));
        assert!(matches!(
            record.set_purpose("abcd").unwrap_err(),
            Error::InvalidPurposeCode
        ));
        assert_eq!(record.purpose(), "");

        record.set_purpose("acct").unwrap();
        assert_eq!(record.purpose(), "ACCT");
    }

    #[test]
    fn test_text_field_limits() {
        let mut record = request();
        record.set_message(&"m".repeat(70)).unwrap();
        let err = record.set_message(&"m".repeat(71)).unwrap_err();
        assert_eq!(err.to_string(), "message is too long");
        assert_eq!(record.message(), "m".repeat(70));

        type Setter = fn(&mut Record, &str) -> Result<()>;
        let setters: [(&str, Setter); 7] = [
            ("shopID", Record::set_shop_id),
            ("merchDevID", Record::set_merch_dev_id),
            ("invoiceID", Record::set_invoice_id),
            ("customerID", Record::set_customer_id),
            ("credTranID", Record::set_cred_tran_id),
            ("loyaltyID", Record::set_loyalty_id),
            ("navCheckID", Record::set_nav_check_id),
        ];
        for (field, setter) in setters {
            setter(&mut record, &"x".repeat(35)).unwrap();
            let err = setter(&mut record, &"x".repeat(36)).unwrap_err();
            assert_eq!(err.to_string(), format!("{field} is too long"));
        }
        assert_eq!(record.nav_check_id(), "x".repeat(35));
    }

    #[test]
    fn test_name_with_line_break_rejected() {
        for name in ["Test\nUser", "Test\rUser", "Test User\r\n"] {
            let err = Record::new_send(BIC, name, IBAN).unwrap_err();
            assert_eq!(err.to_string(), "name should not contain line breaks");
        }
        // Length is still checked first
        let err = Record::new_send(BIC, &format!("{}\n", "a".repeat(70)), IBAN).unwrap_err();
        assert!(matches!(err, Error::InvalidName));
    }

    #[test]
    fn test_text_with_line_break_rejected() {
        type Setter = fn(&mut Record, &str) -> Result<()>;
        let setters: [(&str, Setter); 8] = [
            ("message", Record::set_message),
            ("shopID", Record::set_shop_id),
            ("merchDevID", Record::set_merch_dev_id),
            ("invoiceID", Record::set_invoice_id),
            ("customerID", Record::set_customer_id),
            ("credTranID", Record::set_cred_tran_id),
            ("loyaltyID", Record::set_loyalty_id),
            ("navCheckID", Record::set_nav_check_id),
        ];

        let mut record = request();
        for (field, setter) in setters {
            setter(&mut record, "kept").unwrap();
            for value in ["a\nb", "a\rb", "\n"] {
                let err = setter(&mut record, value).unwrap_err();
                assert_eq!(err.to_string(), format!("{field} should not contain line breaks"));
            }
        }

        let before = record.clone();
        assert!(record.set_message("line\nbreak").is_err());
        assert_eq!(record, before);
        assert_eq!(record.message(), "kept");
        assert_eq!(record.serialize().matches('\n').count(), 17);
    }

    #[test]
    fn test_text_limits_count_characters() {
        let mut record = request();
        record.set_message(&"ő".repeat(70)).unwrap();
        assert!(record.set_message(&"ő".repeat(71)).is_err());
    }

    #[test]
    fn test_version_and_charset() {
        let mut record = request();
        assert_eq!(record.version(), "001");
        assert_eq!(record.charset(), 1);

        record.set_version("002").unwrap();
        record.set_charset(2).unwrap();
        assert_eq!(record.version(), "002");
        assert_eq!(record.charset(), 2);

        assert!(matches!(record.set_version("2").unwrap_err(), Error::InvalidVersion));
        assert!(matches!(record.set_version("00a").unwrap_err(), Error::InvalidVersion));
        assert!(matches!(record.set_charset(10).unwrap_err(), Error::InvalidCharset));
        assert_eq!(record.version(), "002");

        record.set_charset(0).unwrap();
        assert_eq!(record.charset(), 1);
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!("HCT".parse::<Kind>().unwrap(), Kind::Send);
        assert_eq!("RTP".parse::<Kind>().unwrap(), Kind::Request);
        assert!(matches!("rtp".parse::<Kind>().unwrap_err(), Error::InvalidKind));
        assert_eq!(Kind::Send.to_string(), "HCT");
    }

    #[test]
    fn test_format_shape() {
        let record = Record::new_send(BIC, "Test User", IBAN).unwrap();
        let output = record.serialize();

        assert_eq!(output.matches('\n').count(), 17, "has all (even empty) lines");
        assert!(!output.starts_with('\n'));
        assert!(output.ends_with('\n'));
        assert_eq!(output, record.to_string());
    }

    #[test]
    fn test_format_detailed() {
        let mut record = request();
        record.set_huf_amount(500).unwrap();
        record.set_purpose("AGRT").unwrap();
        record.set_message("hello!").unwrap();
        record.set_shop_id("shopIDHere").unwrap();
        record.set_merch_dev_id("merchDevID").unwrap();
        record.set_invoice_id("invoiceID").unwrap();
        record.set_customer_id("cccustomer").unwrap();
        record.set_cred_tran_id("credTransID").unwrap();
        record.set_loyalty_id("loyID").unwrap();
        record.set_nav_check_id("navhere").unwrap();

        let now = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 22, 30, 0)
            .unwrap();
        let output = record.render(now);
        let lines: Vec<&str> = output.split('\n').collect();

        assert_eq!(
            lines,
            [
                "RTP",
                "001",
                "1",
                "abcdefghXXX",
                "Test User",
                IBAN,
                "HUF500",
                "20240309233000+2",
                "AGRT",
                "hello!",
                "shopIDHere",
                "merchDevID",
                "invoiceID",
                "cccustomer",
                "credTransID",
                "loyID",
                "navhere",
                "",
            ]
        );
    }

    #[test]
    fn test_zero_amount_and_unset_fields_are_empty_lines() {
        let mut record = request();
        record.set_huf_amount(0).unwrap();
        let output = record.serialize();
        let lines: Vec<&str> = output.split('\n').collect();

        assert_eq!(lines.len(), 18);
        assert_eq!(lines[6], "");
        assert!(lines[8..].iter().all(|line| line.is_empty()));
    }

    #[test]
    fn test_explicit_validity_is_serialized() {
        let mut record = request();
        let at = Utc::now() + Duration::hours(4);
        record.set_valid_until(at).unwrap();

        let output = record.serialize();
        let lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(lines[7], ValidityDate::new(&at).to_string());
        assert!(lines[7].ends_with("+0"));
    }

    #[test]
    fn test_past_validity_rejected() {
        let mut record = request();
        let err = record
            .set_valid_until(Utc::now() - Duration::seconds(1))
            .unwrap_err();
        assert!(matches!(err, Error::ExpiredValidity));
        assert!(record.valid_until().is_none());

        let now = Utc::now();
        let err = record.set_valid_until_at(&now, now).unwrap_err();
        assert!(matches!(err, Error::ExpiredValidity));
    }

    // An unset validity is accepted and defaulted when serializing, even though
    // an explicit past validity is rejected by the setter.
    #[test]
    fn test_unset_validity_defaults_to_future() {
        let record = request();
        let output = record.serialize();
        let line = output.split('\n').nth(7).unwrap().to_string();

        let wall_clock =
            chrono::NaiveDateTime::parse_from_str(&line[..14], "%Y%m%d%H%M%S").unwrap();
        let offset_hours: i32 = line[14..].parse().unwrap();
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let at = offset.from_local_datetime(&wall_clock).unwrap();

        // The offset is rendered in whole hours, allow for a dropped half hour
        assert!((at + Duration::minutes(45)).with_timezone(&Utc) > Utc::now());
    }

    #[test]
    fn test_default_validity_is_one_hour_after_now() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let output = request().render(now.into());
        assert_eq!(output.split('\n').nth(7), Some("20300101130000+0"));
    }

    #[test]
    fn test_full_record_sizes() {
        let mut record = full_record();
        let payload = record.serialize();
        assert_eq!(payload.len(), 483);
        assert!(matches!(
            record.encodable_payload().unwrap_err(),
            Error::PayloadTooLarge
        ));
        assert!(matches!(
            record.generate_png(256).unwrap_err(),
            Error::PayloadTooLarge
        ));

        record.set_nav_check_id("").unwrap();
        record.set_loyalty_id("").unwrap();
        record.set_cred_tran_id("").unwrap();
        record.set_customer_id("cc").unwrap();
        assert_eq!(record.serialize().len(), MAX_CONTENT_SIZE);

        let png = record.generate_png(256).unwrap();
        assert!(png.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_encode_requires_validity() {
        let mut record = request();
        assert!(matches!(
            record.generate_png(256).unwrap_err(),
            Error::ExpiredValidity
        ));

        record
            .set_valid_until(Utc::now() + Duration::hours(1))
            .unwrap();
        assert!(record.generate_png(256).is_ok());
    }

    #[test]
    fn test_encode_rechecks_expiry() {
        let mut record = request();
        let at = Utc::now() + Duration::hours(1);
        record.set_valid_until(at).unwrap();

        let later = at + Duration::seconds(1);
        assert!(matches!(
            record.encodable_payload_at(later).unwrap_err(),
            Error::ExpiredValidity
        ));
        assert!(record.encodable_payload_at(at - Duration::minutes(1)).is_ok());
    }
}
