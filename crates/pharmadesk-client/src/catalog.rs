//! # Catalog Cache
//!
//! The current medicine snapshot, refreshed from `GET /medicines`.
//!
//! ## Debounced Search
//! ```text
//!  keystroke "p"    keystroke "pa"   keystroke "par"        500 ms quiet
//!      │                 │                │                      │
//!      ▼                 ▼                ▼                      ▼
//!   gen = 1  ───►     gen = 2  ───►    gen = 3  ─────────────► fetch "par"
//!   (superseded,      (superseded,
//!    returns None)     returns None)
//! ```
//!
//! A refresh replaces the whole snapshot; readers holding the previous
//! `Arc<Catalog>` are unaffected. Plain refreshes take a generation too, so
//! a slow response that lands after a newer request started is dropped.
//!
//! Two snapshots are kept. `snapshot()` is the last result as fetched, which
//! is what a list view shows. `stock()` is the union of everything seen since
//! the last unfiltered refresh, fresher entries winning; the cart checks
//! ceilings against it so a narrow search never hides lines already in the
//! cart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};

use pharmadesk_core::validation::validate_search_query;
use pharmadesk_core::{Catalog, CatalogItem};

use crate::error::ClientResult;
use crate::transport::{ApiRequest, Transport};

pub struct CatalogCache<T: Transport> {
    transport: Arc<T>,
    current: RwLock<Arc<Catalog>>,
    stock: RwLock<Arc<Catalog>>,
    debounce: Duration,
    generation: AtomicU64,
}

impl<T: Transport> CatalogCache<T> {
    pub fn new(transport: Arc<T>, debounce: Duration) -> Self {
        CatalogCache {
            transport,
            current: RwLock::new(Arc::new(Catalog::default())),
            stock: RwLock::new(Arc::new(Catalog::default())),
            debounce,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetches the medicine list, optionally filtered server-side.
    ///
    /// A response that arrives after a newer refresh or search has started
    /// is returned to the caller but not stored.
    pub async fn refresh(&self, search: Option<&str>) -> ClientResult<Arc<Catalog>> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.fetch(ticket, search).await
    }

    /// Refreshes after the debounce delay unless a newer call arrives first.
    ///
    /// ## Returns
    /// `Ok(None)` when superseded; no request is made in that case.
    pub async fn search_debounced(&self, term: &str) -> ClientResult<Option<Arc<Catalog>>> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(term, "Search superseded");
            return Ok(None);
        }

        self.fetch(ticket, Some(term)).await.map(Some)
    }

    async fn fetch(&self, ticket: u64, search: Option<&str>) -> ClientResult<Arc<Catalog>> {
        let term = match search {
            Some(term) => validate_search_query(term)?,
            None => String::new(),
        };
        let mut request = ApiRequest::get("/medicines");
        if !term.is_empty() {
            request = request.query("search", term.clone());
        }

        let items: Vec<CatalogItem> = self.transport.data(request).await?;
        let catalog = Arc::new(Catalog::new(items));

        let mut stock = self
            .stock
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(search = %term, "Stale catalog response dropped");
            return Ok(catalog);
        }
        info!(items = catalog.len(), search = %term, "Catalog refreshed");

        *stock = if term.is_empty() {
            catalog.clone()
        } else {
            Arc::new(stock.merged(catalog.items()))
        };
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = catalog.clone();
        Ok(catalog)
    }

    /// Filters the current snapshot without a request.
    pub fn filter_local(&self, term: &str) -> Vec<CatalogItem> {
        self.snapshot().filter(term).into_iter().cloned().collect()
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Every medicine seen since the last full refresh.
    pub fn stock(&self) -> Arc<Catalog> {
        self.stock
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<T: Transport> std::fmt::Debug for CatalogCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("items", &self.snapshot().len())
            .field("debounce", &self.debounce)
            .finish()
    }
}
