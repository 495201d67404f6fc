//! # Domain Types
//!
//! Core domain types shared by the cart engine, the client and the terminal.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │  BillRequest    │   │  UserProfile    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  medicine_id    │   │  customer       │   │  full_name      │       │
//! │  │  medicine_name  │   │  items[]        │   │  role           │       │
//! │  │  quantity       │   │  discount       │   │  image_url      │       │
//! │  │  selling_price  │   │  payment_method │   └─────────────────┘       │
//! │  │  gst_percent    │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ PaymentMethod   │   │      Role       │       │
//! │  │  bps (u32)      │   │  Cash           │   │  Admin          │       │
//! │  │  500 = 5% GST   │   │  Card           │   │  Subadmin       │       │
//! │  └─────────────────┘   │  Upi            │   │  Staff          │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Field names follow the backend JSON (`medicine_id`, `gst_percent`, ...).
//! Rust-side names are used where the wire name would be misleading, with a
//! `#[serde(rename)]` bridging the two.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{major_units, Money};
use crate::{FALLBACK_ERROR_MESSAGE, LOW_STOCK_THRESHOLD, WALK_IN_CUSTOMER};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%. GST slabs map to 500, 1200, 1800 and 2800.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage such as `12` or `2.5`.
    ///
    /// Negative and non-finite inputs read as zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return TaxRate(0);
        }
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display and the wire only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

/// Serde adapter for `gst_percent`, a decimal percentage on the wire.
pub mod tax_percent {
    use super::TaxRate;
    use crate::money::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(rate: &TaxRate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(rate.percentage())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TaxRate, D::Error> {
        match Option::<Decimal>::deserialize(deserializer)? {
            None => Ok(TaxRate::zero()),
            Some(raw) => raw
                .to_f64()
                .map(TaxRate::from_percentage)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Dates arrive as `2026-03-01` or as full timestamps; only the day matters.
/// Unreadable values are treated as "no expiry recorded".
mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub(crate) fn parse(raw: &str) -> Option<NaiveDate> {
        let day = raw.trim().get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

/// Identifiers the backend sends as either numbers or strings.
mod label {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => n.to_string(),
            Raw::Float(n) => n.to_string(),
            Raw::Text(s) => s,
        })
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// Backend identifier of a medicine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct MedicineId(pub i64);

impl fmt::Display for MedicineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MedicineId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(MedicineId)
    }
}

/// A sellable medicine as the backend reports it.
///
/// Immutable snapshot: a catalog refresh replaces every item wholesale,
/// nothing patches an item in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "medicine_id")]
    pub id: MedicineId,

    #[serde(rename = "medicine_name")]
    pub name: String,

    #[serde(default)]
    pub category: String,

    /// Batch/lot identifier printed on the strip.
    #[serde(default)]
    pub batch_number: Option<String>,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default)]
    pub manufacturer: Option<String>,

    /// Units on hand; the ceiling for any cart line of this item.
    #[serde(rename = "quantity", default)]
    pub quantity_on_hand: i64,

    #[serde(default, with = "major_units")]
    pub selling_price: Money,

    #[serde(rename = "gst_percent", default, with = "tax_percent")]
    pub tax_rate: TaxRate,

    #[serde(default, with = "lenient_date")]
    pub expiry_date: Option<NaiveDate>,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl CatalogItem {
    /// Checks if at least one unit can be sold.
    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.quantity_on_hand > 0
    }

    /// Low stock is flagged at or below the threshold (10 by default).
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity_on_hand <= threshold
    }

    /// Uses the crate default threshold.
    pub fn is_low_stock_default(&self) -> bool {
        self.is_low_stock(LOW_STOCK_THRESHOLD)
    }

    /// An item expiring today is already unsellable.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|d| d <= today)
    }

    /// Case-insensitive match on name, raw substring on barcode.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .barcode
                .as_deref()
                .is_some_and(|code| code.contains(&needle))
    }
}

// =============================================================================
// Session Types
// =============================================================================

/// Access level of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Owner account; sees everything including user administration.
    Admin,
    /// Manager; may administer inventory.
    Subadmin,
    /// Counter staff; billing only.
    Staff,
}

impl Role {
    /// Admins and subadmins may add and delete medicines.
    pub fn can_manage_inventory(&self) -> bool {
        matches!(self, Role::Admin | Role::Subadmin)
    }

    /// Only the top-level admin sees super-admin areas.
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Subadmin => "subadmin",
            Role::Staff => "staff",
        }
    }

    /// Capitalized label shown next to the user's name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Subadmin => "Subadmin",
            Role::Staff => "Staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user as returned by `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: Option<i64>,

    pub full_name: String,

    #[serde(default)]
    pub email: Option<String>,

    pub role: Role,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl UserProfile {
    /// Returns the avatar URL, skipping the backend's literal `"None"`.
    pub fn avatar_url(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .filter(|url| !url.is_empty() && *url != "None")
    }
}

// =============================================================================
// Billing Types
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            other => Err(format!(
                "Unknown payment method: '{}'. Valid options: cash, card, upi",
                other
            )),
        }
    }
}

/// Customer details printed on the bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub customer_name: String,

    /// Empty when the customer gave no number.
    #[serde(default)]
    pub phone: String,
}

impl CustomerInfo {
    /// Normalizes blank input: no name means a walk-in customer.
    pub fn new(name: &str, phone: &str) -> Self {
        let name = name.trim();
        CustomerInfo {
            customer_name: if name.is_empty() {
                WALK_IN_CUSTOMER.to_string()
            } else {
                name.to_string()
            },
            phone: phone.trim().to_string(),
        }
    }

    pub fn walk_in() -> Self {
        CustomerInfo::new("", "")
    }
}

impl Default for CustomerInfo {
    fn default() -> Self {
        CustomerInfo::walk_in()
    }
}

/// One `{medicine_id, quantity}` entry of a bill submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub medicine_id: MedicineId,
    pub quantity: i64,
}

/// Payload of `POST /bills`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillRequest {
    pub customer: CustomerInfo,
    pub items: Vec<BillLine>,
    #[serde(with = "major_units")]
    pub discount: Money,
    pub payment_method: PaymentMethod,
}

/// What the backend returns for a persisted bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillReceipt {
    #[serde(default)]
    pub bill_id: Option<i64>,

    #[serde(deserialize_with = "label::deserialize")]
    pub bill_number: String,

    #[serde(default, with = "major_units")]
    pub total_amount: Money,
}

// =============================================================================
// Backend Envelope
// =============================================================================

/// Every backend response is wrapped as `{success, data, message}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,

    pub data: Option<T>,

    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Unwraps `data`, or the server message when the call was unsuccessful.
    pub fn into_data(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .message
                .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())),
        }
    }
}

// =============================================================================
// Inventory Administration
// =============================================================================

/// An image attached to a new medicine record.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The "add medicine" form, sent as multipart to `POST /medicines`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicine {
    pub name: String,
    pub category: String,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub barcode: Option<String>,
    pub quantity: i64,
    pub purchase_price: Money,
    pub selling_price: Money,
    pub tax_rate: TaxRate,
    pub expiry_date: Option<NaiveDate>,
    pub image: Option<ImageUpload>,
}

impl NewMedicine {
    /// Text fields of the multipart form, in backend naming.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("medicine_name", self.name.trim().to_string()),
            ("category", self.category.trim().to_string()),
            ("quantity", self.quantity.to_string()),
            ("purchase_price", self.purchase_price.to_string()),
            ("selling_price", self.selling_price.to_string()),
            ("gst_percent", self.tax_rate.percentage().to_string()),
        ];

        let optional = [
            ("manufacturer", self.manufacturer.as_deref()),
            ("batch_number", self.batch_number.as_deref()),
            ("barcode", self.barcode.as_deref()),
        ];
        for (key, value) in optional {
            if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
                fields.push((key, v.to_string()));
            }
        }

        if let Some(date) = self.expiry_date {
            fields.push(("expiry_date", date.format("%Y-%m-%d").to_string()));
        }

        fields
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
