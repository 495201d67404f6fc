//! # Application Context
//!
//! Built once at startup; every component receives its collaborators here
//! instead of reaching for globals.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          AppContext                                     │
//! │                                                                         │
//! │   ClientConfig ──► SessionStore ──► HttpTransport                      │
//! │                          │               │                              │
//! │                          │      ┌────────┼──────────────┐               │
//! │                          │      ▼        ▼              ▼               │
//! │                          │  CatalogCache  ReportsClient AuthService     │
//! │                          │      │                                       │
//! │                          │      ├──────────► BillingDesk                │
//! │                          └──────┴──────────► MedicineAdmin              │
//! │                                                                         │
//! │   NotificationCenter and ConfirmationService are shared by all.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::info;

use crate::auth::AuthService;
use crate::billing::BillingDesk;
use crate::catalog::CatalogCache;
use crate::config::ClientConfig;
use crate::confirm::ConfirmationService;
use crate::error::ClientResult;
use crate::inventory::MedicineAdmin;
use crate::notify::NotificationCenter;
use crate::reports::ReportsClient;
use crate::session::SessionStore;
use crate::transport::{HttpTransport, Transport};

pub struct AppContext<T: Transport = HttpTransport> {
    pub config: ClientConfig,
    pub session: Arc<SessionStore>,
    pub transport: Arc<T>,
    pub notifications: NotificationCenter,
    pub confirmations: Arc<ConfirmationService>,
    pub catalog: Arc<CatalogCache<T>>,
    pub billing: Arc<BillingDesk<T>>,
    pub inventory: Arc<MedicineAdmin<T>>,
    pub reports: Arc<ReportsClient<T>>,
    pub auth: Arc<AuthService<T>>,
}

impl AppContext<HttpTransport> {
    /// Opens the persisted session and connects to the configured backend.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let session = Arc::new(SessionStore::open(config.session_path())?);
        let transport = Arc::new(HttpTransport::new(config.base_url(), session.clone())?);
        info!(
            base_url = config.base_url(),
            signed_in = session.user().is_some(),
            "Client context ready"
        );
        Ok(Self::with_transport(config, session, transport))
    }
}

impl<T: Transport> AppContext<T> {
    pub fn with_transport(config: ClientConfig, session: Arc<SessionStore>, transport: Arc<T>) -> Self {
        let notifications = NotificationCenter::new(config.notify_ttl());
        let confirmations = Arc::new(ConfirmationService::new());
        let catalog = Arc::new(CatalogCache::new(transport.clone(), config.search_debounce()));

        let billing = Arc::new(BillingDesk::new(
            transport.clone(),
            catalog.clone(),
            notifications.clone(),
            confirmations.clone(),
        ));
        let inventory = Arc::new(MedicineAdmin::new(
            transport.clone(),
            session.clone(),
            billing.clone(),
            notifications.clone(),
            confirmations.clone(),
        ));
        let reports = Arc::new(ReportsClient::new(transport.clone()));
        let auth = Arc::new(AuthService::new(
            transport.clone(),
            session.clone(),
            confirmations.clone(),
        ));

        AppContext {
            config,
            session,
            transport,
            notifications,
            confirmations,
            catalog,
            billing,
            inventory,
            reports,
            auth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::medicine;
    use crate::session::fixtures::signed_in;
    use crate::transport::fake::{ok, FakeTransport};
    use pharmadesk_core::{MedicineId, Role};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_new_uses_configured_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::default();
        config.session.path = Some(dir.path().join("session.json"));
        config.ui.notify_ttl_ms = 1500;

        let ctx = AppContext::new(config).unwrap();
        assert_eq!(ctx.session.path(), Some(dir.path().join("session.json").as_path()));
        assert!(ctx.auth.current_user().is_none());
        assert_eq!(ctx.notifications.ttl(), Duration::from_millis(1500));
        assert_eq!(ctx.transport.base_url(), "https://pharma-back-1.onrender.com/api");
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://pharmacy.local".to_string();
        assert!(AppContext::new(config).is_err());
    }

    #[tokio::test]
    async fn test_components_share_catalog_and_notifications() {
        let transport = Arc::new(FakeTransport::new(|_| {
            ok(json!([medicine(5, "Vitamin D3", 4, 30.0, 5.0)]))
        }));
        let ctx = AppContext::with_transport(
            ClientConfig::default(),
            Arc::new(signed_in(Role::Admin)),
            transport,
        );

        ctx.inventory.list(None).await.unwrap();
        assert_eq!(ctx.billing.add_item(MedicineId(5)).unwrap(), 1);

        ctx.billing.update_quantity(MedicineId(5), 10).unwrap_err();
        assert_eq!(ctx.notifications.active().len(), 1);
    }
}
