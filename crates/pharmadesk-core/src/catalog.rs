//! # Catalog Snapshot
//!
//! An ordered, immutable list of medicines as last fetched from the backend.
//!
//! The cart reads stock ceilings from here and never writes back. A refresh
//! builds a new `Catalog`; holders of the old one keep a consistent view.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::types::{CatalogItem, MedicineId};

/// Immutable medicine list with id lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<MedicineId, usize>,
}

impl Catalog {
    /// Builds a catalog, keeping backend order.
    ///
    /// A duplicated id keeps its first occurrence.
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let mut kept = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());

        for item in items {
            if index.contains_key(&item.id) {
                continue;
            }
            index.insert(item.id, kept.len());
            kept.push(item);
        }

        Catalog { items: kept, index }
    }

    pub fn get(&self, id: MedicineId) -> Option<&CatalogItem> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Overlays fresher items on this catalog.
    ///
    /// Items present in `fresh` replace their old version in place; unseen
    /// ones are appended. Nothing is removed, since a filtered result says
    /// nothing about medicines it did not match.
    pub fn merged(&self, fresh: &[CatalogItem]) -> Catalog {
        let mut items = self.items.clone();
        for item in fresh {
            match self.index.get(&item.id) {
                Some(&i) => items[i] = item.clone(),
                None => items.push(item.clone()),
            }
        }
        Catalog::new(items)
    }

    /// Local substring filter: name case-insensitive, barcode substring.
    ///
    /// A blank term returns everything.
    pub fn filter(&self, term: &str) -> Vec<&CatalogItem> {
        let term = term.trim();
        if term.is_empty() {
            return self.items.iter().collect();
        }
        self.items.iter().filter(|item| item.matches(term)).collect()
    }

    /// Items at or below the threshold.
    pub fn low_stock(&self, threshold: i64) -> Vec<&CatalogItem> {
        self.items
            .iter()
            .filter(|item| item.is_low_stock(threshold))
            .collect()
    }

    /// Items whose expiry date has been reached.
    pub fn expired(&self, today: NaiveDate) -> Vec<&CatalogItem> {
        self.items
            .iter()
            .filter(|item| item.is_expired(today))
            .collect()
    }
}

impl From<Vec<CatalogItem>> for Catalog {
    fn from(items: Vec<CatalogItem>) -> Self {
        Catalog::new(items)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::money::Money;
    use crate::types::TaxRate;

    pub fn item(id: i64, name: &str, stock: i64, price_minor: i64, tax_bps: u32) -> CatalogItem {
        CatalogItem {
            id: MedicineId(id),
            name: name.to_string(),
            category: "General".to_string(),
            batch_number: None,
            barcode: Some(format!("890{:04}", id)),
            manufacturer: None,
            quantity_on_hand: stock,
            selling_price: Money::from_minor(price_minor),
            tax_rate: TaxRate::from_bps(tax_bps),
            expiry_date: None,
            image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::item;
    use super::*;

    #[test]
    fn test_lookup_and_order() {
        let catalog = Catalog::new(vec![
            item(2, "Zinc Tablets", 30, 500, 500),
            item(1, "Amlodipine", 5, 1200, 1200),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.items()[0].name, "Zinc Tablets");
        assert_eq!(catalog.get(MedicineId(1)).unwrap().quantity_on_hand, 5);
        assert!(catalog.get(MedicineId(9)).is_none());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = Catalog::new(vec![
            item(1, "First", 5, 100, 0),
            item(1, "Second", 9, 100, 0),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(MedicineId(1)).unwrap().name, "First");
    }

    #[test]
    fn test_filter() {
        let catalog = Catalog::new(vec![
            item(1, "Amlodipine", 5, 1200, 1200),
            item(2, "Amoxicillin", 8, 900, 1200),
            item(3, "Cetirizine", 40, 300, 1200),
        ]);

        assert_eq!(catalog.filter("AMO").len(), 1);
        assert_eq!(catalog.filter("am").len(), 2);
        assert_eq!(catalog.filter("8900003").len(), 1);
        assert_eq!(catalog.filter("  ").len(), 3);
    }

    #[test]
    fn test_merged_overlays_fresh_items() {
        let full = Catalog::new(vec![
            item(1, "Amlodipine", 5, 1200, 1200),
            item(2, "Amoxicillin", 8, 900, 1200),
        ]);
        let merged = full.merged(&[item(2, "Amoxicillin", 3, 900, 1200), item(4, "Zinc", 9, 100, 0)]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(MedicineId(1)).unwrap().quantity_on_hand, 5);
        assert_eq!(merged.get(MedicineId(2)).unwrap().quantity_on_hand, 3);
        assert_eq!(merged.items()[2].id, MedicineId(4));
    }

    #[test]
    fn test_low_stock() {
        let catalog = Catalog::new(vec![
            item(1, "A", 10, 100, 0),
            item(2, "B", 11, 100, 0),
            item(3, "C", 0, 100, 0),
        ]);
        let low: Vec<_> = catalog.low_stock(10).iter().map(|i| i.id.0).collect();
        assert_eq!(low, vec![1, 3]);
    }
}
