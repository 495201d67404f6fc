//! Report commands. Sales and profit default to the month so far.

use chrono::NaiveDate;

use pharmadesk_client::{AppContext, Transport};
use pharmadesk_core::report::DateRange;
use pharmadesk_core::CoreError;

use crate::commands::ReportKind;
use crate::error::ApiError;
use crate::render;

pub async fn run<T: Transport>(ctx: &AppContext<T>, kind: ReportKind) -> Result<String, ApiError> {
    let today = chrono::Local::now().date_naive();

    match kind {
        ReportKind::Sales(dates) => {
            let report = ctx.reports.sales(range(dates, today)?).await?;
            Ok(render::sales_report(&report))
        }
        ReportKind::Inventory => {
            let report = ctx.reports.inventory().await?;
            Ok(render::inventory_report(&report))
        }
        ReportKind::Profit(dates) => {
            let report = ctx.reports.profit(range(dates, today)?).await?;
            Ok(render::profit_report(&report))
        }
        ReportKind::Expiring(days) => {
            let days = days.unwrap_or(ctx.config.ui.expiry_window_days);
            let report = ctx.reports.expiring(days).await?;
            Ok(render::expiry_report(&report))
        }
    }
}

fn range(dates: Option<(NaiveDate, NaiveDate)>, today: NaiveDate) -> Result<DateRange, ApiError> {
    match dates {
        Some((start, end)) => DateRange::new(start, end).map_err(|e| CoreError::from(e).into()),
        None => Ok(DateRange::month_to_date(today)),
    }
}
