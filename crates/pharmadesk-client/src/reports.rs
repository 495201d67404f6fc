//! # Reports
//!
//! Read-only business reports. Every call is a single `GET`; nothing is
//! cached.
//!
//! | Report    | Endpoint              | Parameters              |
//! |-----------|-----------------------|-------------------------|
//! | Sales     | `/reports/sales`      | `start_date`, `end_date`|
//! | Inventory | `/reports/inventory`  | -                       |
//! | Profit    | `/reports/profit`     | `start_date`, `end_date`|
//! | Expiring  | `/reports/expiring`   | `days`                  |

use std::sync::Arc;
use tracing::debug;

use pharmadesk_core::report::{DateRange, ExpiryReport, InventoryReport, ProfitReport, SalesReport};
use pharmadesk_core::validation::validate_expiry_window;

use crate::error::ClientResult;
use crate::transport::{ApiRequest, Transport};

pub struct ReportsClient<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> ReportsClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        ReportsClient { transport }
    }

    pub async fn sales(&self, range: DateRange) -> ClientResult<SalesReport> {
        debug!(start = %range.start(), end = %range.end(), "Sales report");
        self.transport
            .data(with_range(ApiRequest::get("/reports/sales"), range))
            .await
    }

    pub async fn inventory(&self) -> ClientResult<InventoryReport> {
        self.transport.get_data("/reports/inventory").await
    }

    pub async fn profit(&self, range: DateRange) -> ClientResult<ProfitReport> {
        debug!(start = %range.start(), end = %range.end(), "Profit report");
        self.transport
            .data(with_range(ApiRequest::get("/reports/profit"), range))
            .await
    }

    /// Medicines already expired or expiring within `days`.
    pub async fn expiring(&self, days: i64) -> ClientResult<ExpiryReport> {
        validate_expiry_window(days)?;
        let request = ApiRequest::get("/reports/expiring").query("days", days.to_string());
        self.transport.data(request).await
    }
}

fn with_range(request: ApiRequest, range: DateRange) -> ApiRequest {
    range
        .query_pairs()
        .into_iter()
        .fold(request, |request, (key, value)| request.query(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, ErrorKind};
    use crate::transport::fake::{ok, FakeTransport};
    use chrono::NaiveDate;
    use pharmadesk_core::DEFAULT_EXPIRY_WINDOW_DAYS;
    use serde_json::json;

    fn backend() -> Arc<FakeTransport> {
        Arc::new(FakeTransport::new(|request| match request.path.as_str() {
            "/reports/sales" => ok(json!({
                "summary": { "total_bills": "42", "total_revenue": "18250.50", "average_bill_amount": 434.54 },
                "top_selling_medicines": [
                    { "medicine_name": "Dolo 650", "total_quantity_sold": 120, "total_revenue": 3600 }
                ]
            })),
            "/reports/inventory" => ok(json!({
                "summary": { "total_purchase_value": 50000, "total_selling_value": "72000.00" },
                "low_stock_medicines": [{ "medicine_name": "Insulin Glargine", "quantity": 2 }]
            })),
            "/reports/profit" => ok(json!({
                "total_revenue": 18250.5, "total_cost": 12000, "gross_profit": 6250.5,
                "profit_margin_percent": 34.25
            })),
            "/reports/expiring" => ok(json!({
                "expired": [{ "medicine_name": "ORS Sachet", "expiry_date": "2026-09-30T00:00:00.000Z" }],
                "expiring_soon": []
            })),
            _ => Err(ClientError::NotFound("Route not found".to_string())),
        }))
    }

    fn october() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sales_report_sends_dates() {
        let transport = backend();
        let reports = ReportsClient::new(transport.clone());

        let report = reports.sales(october()).await.unwrap();
        assert_eq!(report.summary.total_bills, 42);
        assert_eq!(report.summary.total_revenue.minor(), 1_825_050);
        assert_eq!(report.top_selling_medicines[0].total_quantity_sold, 120);

        assert_eq!(
            transport.calls()[0].query,
            vec![
                ("start_date".to_string(), "2026-10-01".to_string()),
                ("end_date".to_string(), "2026-10-16".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_inventory_and_profit() {
        let reports = ReportsClient::new(backend());

        let inventory = reports.inventory().await.unwrap();
        assert_eq!(inventory.summary.potential_profit().minor(), 2_200_000);
        assert_eq!(inventory.low_stock_medicines[0].quantity, 2);

        let profit = reports.profit(october()).await.unwrap();
        assert_eq!(profit.gross_profit.minor(), 625_050);
        assert_eq!(profit.profit_margin_percent, 34.25);
    }

    #[tokio::test]
    async fn test_expiring_window() {
        let transport = backend();
        let reports = ReportsClient::new(transport.clone());

        let report = reports.expiring(DEFAULT_EXPIRY_WINDOW_DAYS).await.unwrap();
        assert_eq!(report.expired[0].expiry_day(), Some("2026-09-30"));
        assert_eq!(
            transport.calls()[0].query,
            vec![("days".to_string(), "90".to_string())]
        );

        let err = reports.expiring(0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(transport.calls().len(), 1);
    }
}
