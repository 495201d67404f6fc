//! # Billing Desk
//!
//! The point-of-sale screen's brain: owns the cart, checks it against the
//! catalog, turns it into a bill and tells the user what happened.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  checkout() ──► lock cart ──► begin_checkout ──► phase = Submitting     │
//! │                    │              │                                     │
//! │                    │          EmptyCart ──► warning toast, no request   │
//! │                 unlock                                                  │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │              POST /bills ──── Ok ──► complete_checkout ──► toast        │
//! │                    │                        │                           │
//! │                    │                        ▼                           │
//! │                    │              GET /medicines ──► reconcile          │
//! │                    │                                                    │
//! │                   Err ──► abort_checkout (lines kept) ──► error toast   │
//! │                                                                         │
//! │  A second checkout() while Submitting gets CheckoutInProgress.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart lock is never held across an `.await`.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use pharmadesk_core::{
    BillReceipt, Cart, CartAdjustment, CartSnapshot, CoreError, CustomerInfo, MedicineId, Money,
    PaymentMethod, QuantityChange,
};

use crate::catalog::CatalogCache;
use crate::confirm::ConfirmationService;
use crate::error::{ClientError, ClientResult};
use crate::notify::NotificationCenter;
use crate::transport::{ApiRequest, Transport};

pub const CAPACITY_WARNING: &str = "Maximum stock limit reached in cart";
pub const EMPTY_CART_WARNING: &str = "Please add items to cart";
pub const CLEAR_CART_PROMPT: &str = "Clear current cart?";

// =============================================================================
// Cart State
// =============================================================================

/// Shared cart behind a synchronous lock.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&cart)
    }

    /// Runs `f` with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut cart)
    }
}

// =============================================================================
// Billing Desk
// =============================================================================

pub struct BillingDesk<T: Transport> {
    transport: Arc<T>,
    catalog: Arc<CatalogCache<T>>,
    notifications: NotificationCenter,
    confirmations: Arc<ConfirmationService>,
    cart: CartState,
    snapshots: watch::Sender<CartSnapshot>,
}

impl<T: Transport> BillingDesk<T> {
    pub fn new(
        transport: Arc<T>,
        catalog: Arc<CatalogCache<T>>,
        notifications: NotificationCenter,
        confirmations: Arc<ConfirmationService>,
    ) -> Self {
        let (snapshots, _) = watch::channel(CartSnapshot::default());
        BillingDesk {
            transport,
            catalog,
            notifications,
            confirmations,
            cart: CartState::new(),
            snapshots,
        }
    }

    /// Adds one unit; returns the line's new quantity.
    pub fn add_item(&self, id: MedicineId) -> ClientResult<i64> {
        let stock = self.catalog.stock();
        let quantity = self.mutate(|cart| cart.add_item(&stock, id))?;
        debug!(medicine_id = %id, quantity, "Added to cart");
        Ok(quantity)
    }

    pub fn update_quantity(&self, id: MedicineId, delta: i64) -> ClientResult<QuantityChange> {
        let stock = self.catalog.stock();
        let change = self.mutate(|cart| cart.update_quantity(&stock, id, delta))?;
        debug!(medicine_id = %id, delta, change = ?change, "Cart quantity changed");
        Ok(change)
    }

    pub fn set_quantity(&self, id: MedicineId, quantity: i64) -> ClientResult<QuantityChange> {
        let stock = self.catalog.stock();
        self.mutate(|cart| cart.set_quantity(&stock, id, quantity))
    }

    pub fn remove_item(&self, id: MedicineId) -> ClientResult<()> {
        self.mutate(|cart| cart.remove_item(id))?;
        debug!(medicine_id = %id, "Removed from cart");
        Ok(())
    }

    /// Applies a discount typed by the cashier; unparsable text means zero.
    pub fn set_discount_input(&self, input: &str) -> ClientResult<Money> {
        self.mutate(|cart| cart.set_discount_input(input))
    }

    /// Empties the cart after the user confirms.
    ///
    /// ## Returns
    /// `Ok(false)` if the cart was already empty or the user declined.
    pub async fn clear(&self) -> ClientResult<bool> {
        if self.cart.with_cart(|cart| cart.is_empty()) {
            return Ok(false);
        }
        if !self.confirmations.confirm(CLEAR_CART_PROMPT, None).await {
            debug!("Clear cart declined");
            return Ok(false);
        }
        self.mutate(|cart| cart.clear())?;
        info!("Cart cleared");
        Ok(true)
    }

    /// Turns the cart into a bill.
    pub async fn checkout(
        &self,
        customer: CustomerInfo,
        payment_method: PaymentMethod,
    ) -> ClientResult<BillReceipt> {
        let request = match self.cart.with_cart_mut(|cart| cart.begin_checkout(customer, payment_method)) {
            Ok(request) => request,
            Err(err) => {
                if matches!(err, CoreError::EmptyCart) {
                    self.notifications.warning(EMPTY_CART_WARNING);
                } else {
                    self.notifications.info(err.to_string());
                }
                return Err(err.into());
            }
        };
        self.publish();
        info!(
            lines = request.items.len(),
            payment = ?request.payment_method,
            customer = %request.customer.customer_name,
            "Submitting bill"
        );

        let result = match ApiRequest::post("/bills").json(&request) {
            Ok(api_request) => self.transport.data::<BillReceipt>(api_request).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(receipt) => {
                self.cart.with_cart_mut(|cart| cart.complete_checkout());
                self.publish();
                info!(bill_number = %receipt.bill_number, total = %receipt.total_amount, "Bill generated");
                self.notifications.success(format!(
                    "Bill #{} generated successfully!",
                    receipt.bill_number
                ));
                self.refresh_stock().await;
                Ok(receipt)
            }
            Err(err) => {
                self.cart.with_cart_mut(|cart| cart.abort_checkout());
                self.publish();
                warn!(error = %err, "Billing failed");
                self.notifications
                    .error(format!("Billing Error: {}", err.user_message()));
                Err(err)
            }
        }
    }

    /// Re-checks the cart against the latest stock and reports what changed.
    pub fn reconcile(&self) -> ClientResult<Vec<CartAdjustment>> {
        let stock = self.catalog.stock();
        let adjustments = self.mutate(|cart| cart.reconcile(&stock))?;
        for adjustment in &adjustments {
            self.notifications.warning(adjustment.to_string());
        }
        Ok(adjustments)
    }

    /// Reloads the full catalog, then reconciles the cart against it.
    /// Failures are logged only.
    pub async fn refresh_stock(&self) {
        match self.catalog.refresh(None).await {
            Ok(_) => {
                if let Err(err) = self.reconcile() {
                    warn!(error = %err, "Reconcile after stock refresh failed");
                }
            }
            Err(err) => warn!(error = %err, "Stock refresh failed"),
        }
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.cart.with_cart(|cart| cart.snapshot())
    }

    /// Receiver that sees every accepted change.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn catalog(&self) -> &Arc<CatalogCache<T>> {
        &self.catalog
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Runs a cart mutation; publishes on success, toasts on rejection.
    fn mutate<R>(&self, f: impl FnOnce(&mut Cart) -> Result<R, CoreError>) -> ClientResult<R> {
        match self.cart.with_cart_mut(f) {
            Ok(value) => {
                self.publish();
                Ok(value)
            }
            Err(err) => {
                self.report(&err);
                Err(ClientError::Core(err))
            }
        }
    }

    fn report(&self, err: &CoreError) {
        debug!(error = %err, "Cart change rejected");
        match err {
            CoreError::CapacityExceeded { .. } => {
                self.notifications.warning(CAPACITY_WARNING);
            }
            CoreError::ItemNotFound(_) => {
                self.notifications.error(err.to_string());
            }
            _ => {
                self.notifications.warning(err.to_string());
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}

impl<T: Transport> std::fmt::Debug for BillingDesk<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingDesk")
            .field("cart", &self.snapshot().phase)
            .finish()
    }
}
