//! # pharmadesk-core: Pure Business Logic for PharmaDesk
//!
//! This crate is the **heart** of PharmaDesk. It contains the billing cart
//! and every rule around it as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PharmaDesk Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/terminal                                │   │
//! │  │    search ──► add ──► qty ──► discount ──► checkout            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pharmadesk-client                            │   │
//! │  │    BillingDesk, CatalogCache, SessionStore, HttpTransport      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ pharmadesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │ Medicine  │  │   Money   │  │   Cart    │  │   rules   │  │   │
//! │  │   │   Bill    │  │  TaxRate  │  │ Snapshot  │  │  parsing  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO FILES • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, BillRequest, UserProfile, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`catalog`] - Immutable medicine snapshot with lookup and filtering
//! - [`cart`] - The cart engine and its view models
//! - [`report`] - Report DTOs and date ranges
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use pharmadesk_core::{Cart, Catalog, CatalogItem, MedicineId, Money, TaxRate};
//!
//! let catalog = Catalog::new(vec![CatalogItem {
//!     id: MedicineId(1),
//!     name: "Paracetamol 500mg".to_string(),
//!     category: "Analgesic".to_string(),
//!     batch_number: None,
//!     barcode: None,
//!     manufacturer: None,
//!     quantity_on_hand: 3,
//!     selling_price: Money::from_major(10),
//!     tax_rate: TaxRate::from_bps(500),
//!     expiry_date: None,
//!     image_url: None,
//! }]);
//!
//! let mut cart = Cart::new();
//! cart.add_item(&catalog, MedicineId(1)).unwrap();
//! cart.add_item(&catalog, MedicineId(1)).unwrap();
//!
//! // 2 × 10.00 + 5% GST
//! assert_eq!(cart.compute_totals().grand_total, Money::from_major(21));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartAdjustment, CartPhase, CartSnapshot, CartTotals, QuantityChange};
pub use catalog::Catalog;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct medicines in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Stock at or below this is flagged as low.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Default look-ahead of the expiry report.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 90;

/// Customer name printed when the cashier leaves it blank.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Shown when the backend gives no usable error message.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";
