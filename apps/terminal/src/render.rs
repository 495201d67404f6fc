//! # Rendering
//!
//! Plain-text views of snapshots, reports and messages. Nothing here reads
//! state; every function takes what it shows.

use chrono::NaiveDate;
use std::fmt::Write;

use pharmadesk_client::{ConfirmPrompt, Severity, Toast};
use pharmadesk_core::report::{ExpiryEntry, ExpiryReport, InventoryReport, ProfitReport, SalesReport};
use pharmadesk_core::{BillReceipt, CartPhase, CartSnapshot, CatalogItem, Money, UserProfile};

use crate::error::ApiError;

pub const HELP: &str = "\
Session
  login <email> <password>      sign in
  logout                        sign out (asks first)
  whoami                        current user
Medicines
  list [term]                   fetch medicines, optionally searched on the server
  search <term>                 debounced server search
  find <term>                   filter the loaded list by name or barcode
  medicine add name=.. category=.. qty=.. buy=.. sell=.. gst=..
               [maker=..] [batch=..] [barcode=..] [expiry=YYYY-MM-DD] [image=path]
  medicine delete <id>
Cart
  add <id>                      one more unit
  qty <id> <+n|-n>              change quantity
  set <id> <n>                  set quantity
  remove <id>
  discount <amount>
  cart                          show the cart
  clear                         empty the cart (asks first)
  checkout [cash|card|upi] [phone=..] [customer name]
Reports
  report sales|profit [YYYY-MM-DD YYYY-MM-DD]
  report inventory
  report expiring [days]
Other
  toasts                        notifications still showing
  y / n                         answer a pending question
  help
  quit";

pub fn money(amount: Money) -> String {
    format!("₹ {}", amount)
}

pub fn cart(snapshot: &CartSnapshot) -> String {
    if snapshot.lines.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:<28} {:>5} {:>12} {:>12}", "ID", "Medicine", "Qty", "Price", "Total");
    for line in &snapshot.lines {
        let _ = writeln!(
            out,
            "{:<6} {:<28} {:>5} {:>12} {:>12}",
            line.medicine_id.to_string(),
            truncate(&line.name, 28),
            line.quantity,
            money(line.unit_price),
            money(line.line_total),
        );
    }

    let totals = &snapshot.totals;
    let _ = writeln!(out, "{:>52} {:>12}", "Subtotal", money(totals.subtotal));
    let _ = writeln!(out, "{:>52} {:>12}", "GST", money(totals.tax_total));
    if !totals.discount.is_zero() {
        let _ = writeln!(out, "{:>52} {:>12}", "Discount", format!("- {}", money(totals.discount)));
    }
    let _ = write!(out, "{:>52} {:>12}", "TOTAL", money(totals.grand_total));
    if snapshot.phase == CartPhase::Submitting {
        out.push_str("\n(submitting...)");
    }
    out
}

/// Medicine table with stock and expiry flags.
pub fn catalog(items: &[CatalogItem], low_stock_threshold: i64, today: NaiveDate) -> String {
    if items.is_empty() {
        return "No medicines found".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<28} {:<14} {:>6} {:>12} {:<10} {}",
        "ID", "Medicine", "Category", "Stock", "Price", "Expiry", ""
    );
    for item in items {
        let mut flags = Vec::new();
        if item.is_expired(today) {
            flags.push("EXPIRED");
        }
        if !item.is_in_stock() {
            flags.push("OUT");
        } else if item.is_low_stock(low_stock_threshold) {
            flags.push("LOW");
        }
        let expiry = item
            .expiry_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        let _ = writeln!(
            out,
            "{:<6} {:<28} {:<14} {:>6} {:>12} {:<10} {}",
            item.id.to_string(),
            truncate(&item.name, 28),
            truncate(&item.category, 14),
            item.quantity_on_hand,
            money(item.selling_price),
            expiry,
            flags.join(" "),
        );
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn receipt(receipt: &BillReceipt) -> String {
    format!(
        "Bill #{} saved, total {}",
        receipt.bill_number,
        money(receipt.total_amount)
    )
}

pub fn user(profile: &UserProfile) -> String {
    let mut out = format!("{} ({})", profile.full_name, profile.role.display_name());
    if let Some(email) = &profile.email {
        let _ = write!(out, " <{}>", email);
    }
    out
}

pub fn toast(toast: &Toast) -> String {
    let marker = match toast.severity {
        Severity::Success => "✓",
        Severity::Error => "✗",
        Severity::Warning => "!",
        Severity::Info => "i",
    };
    format!("{} {}: {}", marker, toast.title, toast.message)
}

pub fn prompt(prompt: &ConfirmPrompt) -> String {
    format!("? {}: {} [y/n]", prompt.title, prompt.message)
}

pub fn error(err: &ApiError) -> String {
    format!("✗ {}", err)
}

// =============================================================================
// Reports
// =============================================================================

pub fn sales_report(report: &SalesReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "Bills: {}   Revenue: {}   Average bill: {}",
        summary.total_bills,
        money(summary.total_revenue),
        money(summary.average_bill_amount)
    );
    if !report.top_selling_medicines.is_empty() {
        out.push_str("\nTop sellers:");
        for top in &report.top_selling_medicines {
            let _ = write!(
                out,
                "\n  {:<28} {:>6} sold {:>14}",
                truncate(&top.medicine_name, 28),
                top.total_quantity_sold,
                money(top.total_revenue)
            );
        }
    }
    out
}

pub fn inventory_report(report: &InventoryReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "Stock at cost: {}   At selling price: {}   Potential profit: {}",
        money(summary.total_purchase_value),
        money(summary.total_selling_value),
        money(summary.potential_profit())
    );
    if !report.low_stock_medicines.is_empty() {
        out.push_str("\nLow stock:");
        for level in &report.low_stock_medicines {
            let _ = write!(out, "\n  {:<28} {:>6}", truncate(&level.medicine_name, 28), level.quantity);
        }
    }
    out
}

pub fn profit_report(report: &ProfitReport) -> String {
    format!(
        "Revenue: {}   Cost: {}   Gross profit: {}   Margin: {:.2}%",
        money(report.total_revenue),
        money(report.total_cost),
        money(report.gross_profit),
        report.profit_margin_percent
    )
}

pub fn expiry_report(report: &ExpiryReport) -> String {
    let mut out = String::new();
    for (title, entries) in [("Expired", &report.expired), ("Expiring soon", &report.expiring_soon)] {
        let _ = write!(out, "{} ({})", title, entries.len());
        for entry in entries {
            let _ = write!(out, "\n  {}", expiry_line(entry));
        }
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    out
}

fn expiry_line(entry: &ExpiryEntry) -> String {
    format!(
        "{:<28} {:<12} {:>6} {}",
        truncate(&entry.medicine_name, 28),
        entry.batch_number.as_deref().unwrap_or("-"),
        entry.quantity.map(|q| q.to_string()).unwrap_or_else(|| "-".to_string()),
        entry.expiry_day().unwrap_or("-")
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmadesk_core::{Cart, Catalog, MedicineId, TaxRate};

    fn item(id: i64, name: &str, stock: i64, expiry: Option<&str>) -> CatalogItem {
        CatalogItem {
            id: MedicineId(id),
            name: name.to_string(),
            category: "Analgesic".to_string(),
            batch_number: None,
            barcode: None,
            manufacturer: None,
            quantity_on_hand: stock,
            selling_price: Money::from_minor(1000),
            tax_rate: TaxRate::from_bps(500),
            expiry_date: expiry.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            image_url: None,
        }
    }

    #[test]
    fn test_cart_view() {
        let catalog = Catalog::new(vec![item(1, "Paracetamol 500", 3, None)]);
        let mut cart = Cart::new();
        cart.add_item(&catalog, MedicineId(1)).unwrap();
        cart.add_item(&catalog, MedicineId(1)).unwrap();
        cart.set_discount_input("25").unwrap();

        let text = cart_view(&cart);
        assert!(text.contains("Paracetamol 500"));
        assert!(text.contains("₹ 20.00"));
        assert!(text.contains("₹ 1.00"));
        assert!(text.contains("- ₹ 25.00"));
        assert!(text.trim_end().ends_with("₹ 0.00"));

        assert_eq!(super::cart(&CartSnapshot::default()), "Cart is empty");
    }

    fn cart_view(cart: &Cart) -> String {
        super::cart(&cart.snapshot())
    }

    #[test]
    fn test_catalog_flags() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let items = vec![
            item(1, "Amoxicillin", 50, Some("2027-01-01")),
            item(2, "ORS Sachet", 4, Some("2026-10-16")),
            item(3, "Insulin", 0, None),
        ];

        let text = catalog(&items, 10, today);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(!lines[1].contains("LOW"));
        assert!(lines[2].ends_with("EXPIRED LOW"));
        assert!(lines[3].ends_with("OUT"));

        assert_eq!(catalog(&[], 10, today), "No medicines found");
    }

    #[test]
    fn test_messages() {
        let toast = Toast {
            id: "t1".to_string(),
            severity: Severity::Warning,
            title: "Warning".to_string(),
            message: "Maximum stock limit reached in cart".to_string(),
        };
        assert_eq!(super::toast(&toast), "! Warning: Maximum stock limit reached in cart");

        let prompt = ConfirmPrompt {
            id: "p1".to_string(),
            title: "Are you sure?".to_string(),
            message: "Clear current cart?".to_string(),
        };
        assert_eq!(super::prompt(&prompt), "? Are you sure?: Clear current cart? [y/n]");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dolo", 28), "Dolo");
        assert_eq!(truncate("Azithromycin", 6), "Azith…");
    }
}
