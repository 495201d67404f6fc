//! # Report DTOs
//!
//! Read-only shapes of the backend report endpoints, plus the date range
//! those endpoints take.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{major_units, Money};
use crate::validation::validate_date_range;

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive report period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        validate_date_range(start, end)?;
        Ok(DateRange { start, end })
    }

    /// First day of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        DateRange { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// `start_date=YYYY-MM-DD` / `end_date=YYYY-MM-DD` query pairs.
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("start_date", self.start.format("%Y-%m-%d").to_string()),
            ("end_date", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

/// Aggregate counts arrive as numbers or numeric strings.
mod count {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(0),
            Some(Raw::Int(n)) => Ok(n),
            Some(Raw::Float(n)) => Ok(n.round() as i64),
            Some(Raw::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(|n| n.round() as i64)
                .map_err(|_| serde::de::Error::custom(format!("invalid count '{}'", s))),
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    #[serde(default, deserialize_with = "count::deserialize")]
    pub total_bills: i64,
    #[serde(default, with = "major_units")]
    pub total_revenue: Money,
    #[serde(default, with = "major_units")]
    pub average_bill_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSeller {
    pub medicine_name: String,
    #[serde(default, deserialize_with = "count::deserialize")]
    pub total_quantity_sold: i64,
    #[serde(default, with = "major_units")]
    pub total_revenue: Money,
}

/// `GET /reports/sales`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    #[serde(default)]
    pub summary: SalesSummary,
    #[serde(default)]
    pub top_selling_medicines: Vec<TopSeller>,
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    #[serde(default, with = "major_units")]
    pub total_purchase_value: Money,
    #[serde(default, with = "major_units")]
    pub total_selling_value: Money,
}

impl InventorySummary {
    /// Margin locked up in current stock.
    pub fn potential_profit(&self) -> Money {
        self.total_selling_value - self.total_purchase_value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub medicine_name: String,
    #[serde(default, deserialize_with = "count::deserialize")]
    pub quantity: i64,
}

/// `GET /reports/inventory`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryReport {
    #[serde(default)]
    pub summary: InventorySummary,
    #[serde(default)]
    pub low_stock_medicines: Vec<StockLevel>,
}

// =============================================================================
// Profit
// =============================================================================

/// `GET /reports/profit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitReport {
    #[serde(default, with = "major_units")]
    pub total_revenue: Money,
    #[serde(default, with = "major_units")]
    pub total_cost: Money,
    #[serde(default, with = "major_units")]
    pub gross_profit: Money,
    #[serde(default)]
    pub profit_margin_percent: f64,
}

// =============================================================================
// Expiry
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiryEntry {
    pub medicine_name: String,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    /// Kept as sent; only the date part is shown.
    #[serde(default)]
    pub expiry_date: Option<String>,
}

impl ExpiryEntry {
    pub fn expiry_day(&self) -> Option<&str> {
        self.expiry_date.as_deref().and_then(|d| d.get(..10).or(Some(d)))
    }
}

/// `GET /reports/expiring`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpiryReport {
    #[serde(default)]
    pub expired: Vec<ExpiryEntry>,
    #[serde(default)]
    pub expiring_soon: Vec<ExpiryEntry>,
}
