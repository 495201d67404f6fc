//! Cart commands. Every change answers with the updated cart.
//!
//! The billing desk already toasts its own failures, so errors from it are
//! marked as notified and the shell does not print them twice.

use pharmadesk_client::{AppContext, ClientError, Transport};
use pharmadesk_core::{CustomerInfo, MedicineId, PaymentMethod};

use crate::error::ApiError;
use crate::render;

fn toasted(err: ClientError) -> ApiError {
    ApiError::from(err).notified()
}

/// Adds one unit, fetching the medicine list first if nothing is loaded yet.
pub async fn add<T: Transport>(ctx: &AppContext<T>, id: MedicineId) -> Result<String, ApiError> {
    if ctx.catalog.stock().is_empty() {
        ctx.catalog.refresh(None).await?;
    }
    ctx.billing.add_item(id).map_err(toasted)?;
    Ok(show(ctx))
}

pub fn quantity<T: Transport>(
    ctx: &AppContext<T>,
    id: MedicineId,
    delta: i64,
) -> Result<String, ApiError> {
    ctx.billing.update_quantity(id, delta).map_err(toasted)?;
    Ok(show(ctx))
}

pub fn set<T: Transport>(
    ctx: &AppContext<T>,
    id: MedicineId,
    quantity: i64,
) -> Result<String, ApiError> {
    ctx.billing.set_quantity(id, quantity).map_err(toasted)?;
    Ok(show(ctx))
}

pub fn remove<T: Transport>(ctx: &AppContext<T>, id: MedicineId) -> Result<String, ApiError> {
    ctx.billing.remove_item(id).map_err(toasted)?;
    Ok(show(ctx))
}

/// Unreadable input counts as no discount.
pub fn discount<T: Transport>(ctx: &AppContext<T>, input: &str) -> Result<String, ApiError> {
    ctx.billing.set_discount_input(input).map_err(toasted)?;
    Ok(show(ctx))
}

pub fn show<T: Transport>(ctx: &AppContext<T>) -> String {
    render::cart(&ctx.billing.snapshot())
}

pub async fn clear<T: Transport>(ctx: &AppContext<T>) -> Result<String, ApiError> {
    if ctx.billing.snapshot().lines.is_empty() {
        return Ok("Cart is already empty".to_string());
    }
    if ctx.billing.clear().await.map_err(toasted)? {
        Ok("Cart cleared".to_string())
    } else {
        Ok("Cart kept".to_string())
    }
}

pub async fn checkout<T: Transport>(
    ctx: &AppContext<T>,
    customer: CustomerInfo,
    payment: PaymentMethod,
) -> Result<String, ApiError> {
    let receipt = ctx.billing.checkout(customer, payment).await.map_err(toasted)?;
    Ok(render::receipt(&receipt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::context;
    use pharmadesk_client::transport::RequestBody;
    use pharmadesk_client::Method;
    use pharmadesk_core::Role;

    #[tokio::test]
    async fn test_first_add_loads_medicines_once() {
        let (ctx, backend) = context(Some(Role::Staff));

        let text = add(&ctx, MedicineId(1)).await.unwrap();
        assert!(text.contains("Dolo 650"));
        add(&ctx, MedicineId(2)).await.unwrap();

        assert_eq!(backend.count(Method::Get, "/medicines"), 1);
        assert_eq!(ctx.billing.snapshot().line_count, 2);
    }

    #[tokio::test]
    async fn test_stock_limit_is_toasted_not_repeated() {
        let (ctx, _backend) = context(Some(Role::Staff));
        for _ in 0..3 {
            add(&ctx, MedicineId(1)).await.unwrap();
        }

        let err = add(&ctx, MedicineId(1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.notified);
        assert_eq!(ctx.notifications.active().len(), 1);
        assert_eq!(ctx.billing.snapshot().lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_quantity_and_discount_update_totals() {
        let (ctx, _backend) = context(Some(Role::Staff));
        add(&ctx, MedicineId(2)).await.unwrap();

        quantity(&ctx, MedicineId(2), 2).unwrap();
        let text = discount(&ctx, "20").unwrap();
        assert!(text.contains("- ₹ 20.00"), "{}", text);

        let text = set(&ctx, MedicineId(2), 0).unwrap();
        assert_eq!(text, "Cart is empty");
        assert!(remove(&ctx, MedicineId(2)).is_err());
    }

    #[tokio::test]
    async fn test_checkout_sends_bill_and_empties_cart() {
        let (ctx, backend) = context(Some(Role::Staff));
        add(&ctx, MedicineId(1)).await.unwrap();
        add(&ctx, MedicineId(1)).await.unwrap();

        let text = checkout(&ctx, CustomerInfo::new("Anil Kumar", "9876543210"), PaymentMethod::Upi)
            .await
            .unwrap();
        assert_eq!(text, "Bill #INV-0077 saved, total ₹ 67.20");
        assert_eq!(show(&ctx), "Cart is empty");

        let bill = backend
            .calls()
            .into_iter()
            .find(|r| r.path == "/bills")
            .unwrap();
        let RequestBody::Json(body) = bill.body else {
            panic!("bill should be json");
        };
        assert_eq!(body["customer"]["customer_name"], "Anil Kumar");
        assert_eq!(body["payment_method"], "upi");
        assert_eq!(body["items"][0]["quantity"], 2);
    }

    #[tokio::test]
    async fn test_empty_checkout_makes_no_request() {
        let (ctx, backend) = context(Some(Role::Staff));

        let err = checkout(&ctx, CustomerInfo::walk_in(), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert!(backend.count(Method::Post, "/bills") == 0);
    }

    #[tokio::test]
    async fn test_clear_empty_cart_does_not_ask() {
        let (ctx, _backend) = context(Some(Role::Staff));
        assert_eq!(clear(&ctx).await.unwrap(), "Cart is already empty");
        assert!(ctx.confirmations.pending().is_none());
    }
}
