//! # Cart Engine
//!
//! The billing cart: line items drawn from a catalog snapshot, bounded by
//! stock, with tax and discount totals and the checkout payload.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Phases                                     │
//! │                                                                         │
//! │            add first line                                               │
//! │   ┌───────┐ ─────────────► ┌───────────┐  begin_checkout ┌───────────┐ │
//! │   │ Empty │                │ Populated │ ──────────────► │Submitting │ │
//! │   └───────┘ ◄───────────── └───────────┘ ◄────────────── └─────┬─────┘ │
//! │       ▲      remove last line             abort_checkout       │       │
//! │       │                                                        │       │
//! │       └──────────────────── complete_checkout ─────────────────┘       │
//! │                                                                         │
//! │  While Submitting every mutation fails with CheckoutInProgress.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Every line satisfies `0 < quantity <= stock` as of the catalog it was
//!   last checked against. A line is removed, never zeroed.
//! - Lines are unique by medicine and kept in insertion order.
//! - Discount is never negative. The grand total floors at zero.
//! - A rejected operation leaves the cart untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BillLine, BillRequest, CatalogItem, CustomerInfo, MedicineId, PaymentMethod, TaxRate};
use crate::validation::parse_amount_lenient;
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// One medicine in the cart.
///
/// Name, price and tax rate are frozen when the line is first added, so the
/// bill shows what the cashier saw even if a refresh changes the price.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    medicine_id: MedicineId,
    name: String,
    unit_price: Money,
    tax_rate: TaxRate,
    quantity: i64,
    added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_item(item: &CatalogItem) -> Self {
        CartLine {
            medicine_id: item.id,
            name: item.name.clone(),
            unit_price: item.selling_price,
            tax_rate: item.tax_rate,
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    pub fn medicine_id(&self) -> MedicineId {
        self.medicine_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Tax on the line total, rounded per line.
    pub fn line_tax(&self) -> Money {
        self.line_total().calculate_tax(self.tax_rate)
    }
}

// =============================================================================
// View Models
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CartPhase {
    Empty,
    Populated,
    Submitting,
}

/// Money summary of the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub discount: Money,
    pub grand_total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLineView {
    pub medicine_id: MedicineId,
    pub name: String,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub quantity: i64,
    pub line_total: Money,
    pub line_tax: Money,
}

/// Everything a renderer needs; nothing is read back from the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSnapshot {
    pub phase: CartPhase,
    pub lines: Vec<CartLineView>,
    pub totals: CartTotals,
    pub line_count: usize,
}

impl Default for CartSnapshot {
    fn default() -> Self {
        Cart::new().snapshot()
    }
}

/// Outcome of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated(i64),
    Removed,
}

/// Why `reconcile` touched a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAdjustment {
    /// The medicine is no longer in the catalog.
    Vanished { id: MedicineId, name: String },
    /// Nothing left on hand.
    SoldOut { id: MedicineId, name: String },
    /// Stock dropped below the cart quantity.
    Clamped {
        id: MedicineId,
        name: String,
        from: i64,
        to: i64,
    },
}

impl std::fmt::Display for CartAdjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartAdjustment::Vanished { name, .. } => {
                write!(f, "{} is no longer available and was removed", name)
            }
            CartAdjustment::SoldOut { name, .. } => {
                write!(f, "{} is out of stock and was removed", name)
            }
            CartAdjustment::Clamped { name, to, .. } => {
                write!(f, "Only {} of {} left; quantity reduced", to, name)
            }
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The billing cart.
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    discount: Money,
    submitting: bool,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            discount: Money::zero(),
            submitting: false,
        }
    }

    pub fn phase(&self) -> CartPhase {
        if self.submitting {
            CartPhase::Submitting
        } else if self.lines.is_empty() {
            CartPhase::Empty
        } else {
            CartPhase::Populated
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: MedicineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.medicine_id == id)
    }

    pub fn quantity_of(&self, id: MedicineId) -> i64 {
        self.line(id).map(|l| l.quantity).unwrap_or(0)
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn ensure_editable(&self) -> CoreResult<()> {
        if self.submitting {
            return Err(CoreError::CheckoutInProgress);
        }
        Ok(())
    }

    /// Adds one unit of a medicine.
    ///
    /// ## Behavior
    /// - Line exists: quantity + 1, provided stock allows it
    /// - No line yet: new line with quantity 1, provided at least one is on hand
    ///
    /// ## Returns
    /// The line's new quantity.
    pub fn add_item(&mut self, catalog: &Catalog, id: MedicineId) -> CoreResult<i64> {
        self.ensure_editable()?;
        let item = catalog.get(id).ok_or(CoreError::ItemNotFound(id))?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.medicine_id == id) {
            let requested = line.quantity.saturating_add(1);
            if requested > item.quantity_on_hand {
                return Err(CoreError::CapacityExceeded {
                    id,
                    name: item.name.clone(),
                    available: item.quantity_on_hand,
                    requested,
                });
            }
            line.quantity = requested;
            return Ok(requested);
        }

        if !item.is_in_stock() {
            return Err(CoreError::OutOfStock {
                id,
                name: item.name.clone(),
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_item(item));
        Ok(1)
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// ## Behavior
    /// - `new == 0` removes the line
    /// - `new < 0` → `QuantityOutOfRange`
    /// - increases are checked against current stock; decreases never are,
    ///   so a cashier can always walk a line down after stock shrinks
    ///
    /// `current + delta` saturates, so an absurd delta is rejected like any
    /// other out-of-range request.
    pub fn update_quantity(
        &mut self,
        catalog: &Catalog,
        id: MedicineId,
        delta: i64,
    ) -> CoreResult<QuantityChange> {
        self.ensure_editable()?;
        let pos = self.position(id)?;
        let requested = self.lines[pos].quantity.saturating_add(delta);
        self.apply_quantity(catalog, pos, requested)
    }

    /// Sets an absolute quantity; same rules as [`Cart::update_quantity`].
    pub fn set_quantity(
        &mut self,
        catalog: &Catalog,
        id: MedicineId,
        quantity: i64,
    ) -> CoreResult<QuantityChange> {
        self.ensure_editable()?;
        let pos = self.position(id)?;
        self.apply_quantity(catalog, pos, quantity)
    }

    fn position(&self, id: MedicineId) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.medicine_id == id)
            .ok_or(CoreError::LineNotInCart(id))
    }

    fn apply_quantity(
        &mut self,
        catalog: &Catalog,
        pos: usize,
        requested: i64,
    ) -> CoreResult<QuantityChange> {
        let id = self.lines[pos].medicine_id;

        if requested < 0 {
            return Err(CoreError::QuantityOutOfRange { id, requested });
        }

        if requested == 0 {
            self.lines.remove(pos);
            return Ok(QuantityChange::Removed);
        }

        if requested > self.lines[pos].quantity {
            let item = catalog.get(id).ok_or(CoreError::ItemNotFound(id))?;
            if requested > item.quantity_on_hand {
                return Err(CoreError::CapacityExceeded {
                    id,
                    name: item.name.clone(),
                    available: item.quantity_on_hand,
                    requested,
                });
            }
        }

        self.lines[pos].quantity = requested;
        Ok(QuantityChange::Updated(requested))
    }

    pub fn remove_item(&mut self, id: MedicineId) -> CoreResult<()> {
        self.ensure_editable()?;
        let before = self.lines.len();
        self.lines.retain(|l| l.medicine_id != id);

        if self.lines.len() == before {
            Err(CoreError::LineNotInCart(id))
        } else {
            Ok(())
        }
    }

    /// Sets the discount; negatives clamp to zero.
    pub fn set_discount(&mut self, discount: Money) -> CoreResult<Money> {
        self.ensure_editable()?;
        self.discount = discount.floor_zero();
        Ok(self.discount)
    }

    /// Sets the discount from free text (`"12.5"`, `"abc"` → 0).
    pub fn set_discount_input(&mut self, input: &str) -> CoreResult<Money> {
        self.set_discount(parse_amount_lenient(input))
    }

    /// Empties the cart and resets the discount.
    pub fn clear(&mut self) -> CoreResult<()> {
        self.ensure_editable()?;
        self.lines.clear();
        self.discount = Money::zero();
        Ok(())
    }

    /// Subtotal, per-line rounded tax, discount and floored grand total.
    pub fn compute_totals(&self) -> CartTotals {
        let subtotal: Money = self.lines.iter().map(CartLine::line_total).sum();
        let tax_total: Money = self.lines.iter().map(CartLine::line_tax).sum();
        CartTotals {
            subtotal,
            tax_total,
            discount: self.discount,
            grand_total: (subtotal + tax_total - self.discount).floor_zero(),
        }
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Freezes the cart and builds the bill payload.
    pub fn begin_checkout(
        &mut self,
        customer: CustomerInfo,
        payment_method: PaymentMethod,
    ) -> CoreResult<BillRequest> {
        self.ensure_editable()?;
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        self.submitting = true;
        Ok(BillRequest {
            customer,
            items: self
                .lines
                .iter()
                .map(|l| BillLine {
                    medicine_id: l.medicine_id,
                    quantity: l.quantity,
                })
                .collect(),
            discount: self.discount,
            payment_method,
        })
    }

    /// The bill was persisted: start over.
    pub fn complete_checkout(&mut self) {
        self.lines.clear();
        self.discount = Money::zero();
        self.submitting = false;
    }

    /// The bill was rejected: unfreeze, keep everything for a retry.
    pub fn abort_checkout(&mut self) {
        self.submitting = false;
    }

    /// Re-checks every line against a fresh catalog.
    ///
    /// Lines whose medicine vanished or sold out are dropped; lines above the
    /// new stock are clamped down to it.
    pub fn reconcile(&mut self, catalog: &Catalog) -> CoreResult<Vec<CartAdjustment>> {
        self.ensure_editable()?;
        let mut adjustments = Vec::new();

        self.lines.retain_mut(|line| {
            let id = line.medicine_id;
            match catalog.get(id) {
                None => {
                    adjustments.push(CartAdjustment::Vanished {
                        id,
                        name: line.name.clone(),
                    });
                    false
                }
                Some(item) if !item.is_in_stock() => {
                    adjustments.push(CartAdjustment::SoldOut {
                        id,
                        name: line.name.clone(),
                    });
                    false
                }
                Some(item) if line.quantity > item.quantity_on_hand => {
                    adjustments.push(CartAdjustment::Clamped {
                        id,
                        name: line.name.clone(),
                        from: line.quantity,
                        to: item.quantity_on_hand,
                    });
                    line.quantity = item.quantity_on_hand;
                    true
                }
                Some(_) => true,
            }
        });

        Ok(adjustments)
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            phase: self.phase(),
            lines: self
                .lines
                .iter()
                .map(|l| CartLineView {
                    medicine_id: l.medicine_id,
                    name: l.name.clone(),
                    unit_price: l.unit_price,
                    tax_rate: l.tax_rate,
                    quantity: l.quantity,
                    line_total: l.line_total(),
                    line_tax: l.line_tax(),
                })
                .collect(),
            totals: self.compute_totals(),
            line_count: self.lines.len(),
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
