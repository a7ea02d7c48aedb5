use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fulfillment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    Pending,
    Accepted,
    Declined,
    Done,
}

impl Progress {
    pub const ALL: [Progress; 4] = [
        Progress::Pending,
        Progress::Accepted,
        Progress::Declined,
        Progress::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Progress::Pending => "pending",
            Progress::Accepted => "accepted",
            Progress::Declined => "declined",
            Progress::Done => "done",
        }
    }

    /// States that can only be entered while holding an order code.
    pub fn requires_order_code(&self) -> bool {
        matches!(self, Progress::Accepted | Progress::Done)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Progress {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Progress::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PaymentType {
    #[serde(rename = "COD")]
    Cod,
    Prepaid,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cod => "COD",
            PaymentType::Prepaid => "Prepaid",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(PaymentType::Cod),
            "Prepaid" => Ok(PaymentType::Prepaid),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

/// Human-readable order identifier: seven characters from `A-Z0-9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Order code must be {len} uppercase letters or digits.", len = OrderCode::LEN)]
pub struct InvalidOrderCode;

impl OrderCode {
    pub const LEN: usize = 7;
    const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Trims and uppercases `raw` before checking its shape.
    pub fn parse(raw: &str) -> Result<Self, InvalidOrderCode> {
        let code = raw.trim().to_ascii_uppercase();
        let well_formed = code.len() == Self::LEN
            && code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

        if well_formed {
            Ok(Self(code))
        } else {
            Err(InvalidOrderCode)
        }
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..Self::LEN)
            .map(|_| {
                let idx = rng.gen_range(0..Self::ALPHABET.len());
                char::from(Self::ALPHABET[idx])
            })
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub payment_platform: String,
    pub payment_platform_user_name: String,
    pub account_id: Uuid,
    pub internal_note: Option<String>,
}

/// How an order is paid. Only prepaid orders carry payment details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    Cod,
    Prepaid(PaymentDetails),
}

impl PaymentMethod {
    pub fn payment_type(&self) -> PaymentType {
        match self {
            PaymentMethod::Cod => PaymentType::Cod,
            PaymentMethod::Prepaid(_) => PaymentType::Prepaid,
        }
    }

    pub fn details(&self) -> Option<&PaymentDetails> {
        match self {
            PaymentMethod::Cod => None,
            PaymentMethod::Prepaid(details) => Some(details),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub order_code: Option<OrderCode>,
    pub order_name: String,
    pub products: Vec<LineItem>,
    pub total_amount: f64,
    pub payment: PaymentMethod,
    pub payment_screenshots: Vec<String>,
    pub transaction_screenshot: Option<String>,
    pub progress: Progress,
    pub reason: Option<String>,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub address: String,
    pub site_owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Every stored file this order points at.
    pub fn screenshot_urls(&self) -> impl Iterator<Item = &str> {
        self.payment_screenshots
            .iter()
            .map(String::as_str)
            .chain(self.transaction_screenshot.as_deref())
    }
}

/// A validated order ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_name: String,
    pub products: Vec<LineItem>,
    pub total_amount: f64,
    pub payment: PaymentMethod,
    pub payment_screenshots: Vec<String>,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub address: String,
    pub site_owner: Uuid,
}

/// Everything a progress transition writes, applied by the store as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressChange {
    pub progress: Progress,
    pub assign_code: Option<OrderCode>,
    pub reason: Option<String>,
    pub deduct_stock: Vec<LineItem>,
}
