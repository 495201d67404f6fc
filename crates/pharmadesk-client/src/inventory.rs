//! # Medicine Administration
//!
//! Adding and deleting medicines. Restricted to roles that may manage
//! inventory; everyone else is refused before any request is made.
//!
//! Every successful change reloads stock through the billing desk, so the
//! cart drops or trims lines for medicines that changed underneath it.

use std::sync::Arc;
use tracing::{info, warn};

use pharmadesk_core::validation::validate_new_medicine;
use pharmadesk_core::{Catalog, MedicineId, NewMedicine};

use crate::billing::BillingDesk;
use crate::confirm::ConfirmationService;
use crate::error::{ClientError, ClientResult};
use crate::notify::NotificationCenter;
use crate::session::SessionStore;
use crate::transport::{ensure_success, ApiRequest, FormPayload, Transport};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this medicine?";

pub struct MedicineAdmin<T: Transport> {
    transport: Arc<T>,
    session: Arc<SessionStore>,
    billing: Arc<BillingDesk<T>>,
    notifications: NotificationCenter,
    confirmations: Arc<ConfirmationService>,
}

impl<T: Transport> MedicineAdmin<T> {
    pub fn new(
        transport: Arc<T>,
        session: Arc<SessionStore>,
        billing: Arc<BillingDesk<T>>,
        notifications: NotificationCenter,
        confirmations: Arc<ConfirmationService>,
    ) -> Self {
        MedicineAdmin {
            transport,
            session,
            billing,
            notifications,
            confirmations,
        }
    }

    /// The medicine table, optionally searched server-side.
    pub async fn list(&self, search: Option<&str>) -> ClientResult<Arc<Catalog>> {
        self.billing.catalog().refresh(search).await
    }

    /// Creates a medicine from the form, image included.
    pub async fn add_medicine(&self, form: NewMedicine) -> ClientResult<()> {
        self.ensure_can_manage("add medicines")?;

        let result = self.submit_new(form).await;
        match result {
            Ok(name) => {
                info!(medicine = %name, "Medicine added");
                self.refresh_list().await;
                self.notifications.success("Medicine added successfully");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Adding medicine failed");
                self.notifications
                    .error(format!("Error adding medicine: {}", err.user_message()));
                Err(err)
            }
        }
    }

    /// Deletes after the user confirms.
    ///
    /// ## Returns
    /// `Ok(false)` if the user declined.
    pub async fn delete_medicine(&self, id: MedicineId) -> ClientResult<bool> {
        self.ensure_can_manage("delete medicines")?;

        if !self.confirmations.confirm(DELETE_PROMPT, None).await {
            return Ok(false);
        }

        let path = format!("/medicines/{}", id);
        match self.transport.send(ApiRequest::delete(path)).await.and_then(ensure_success) {
            Ok(_) => {
                info!(medicine_id = %id, "Medicine deleted");
                self.refresh_list().await;
                self.notifications.success("Medicine deleted successfully");
                Ok(true)
            }
            Err(err) => {
                warn!(medicine_id = %id, error = %err, "Deleting medicine failed");
                self.notifications.error(err.user_message());
                Err(err)
            }
        }
    }

    fn ensure_can_manage(&self, action: &str) -> ClientResult<()> {
        let user = self.session.user().ok_or(ClientError::NotAuthenticated)?;
        if user.role.can_manage_inventory() {
            return Ok(());
        }
        warn!(role = user.role.as_str(), action, "Inventory change refused");
        let err = ClientError::Forbidden(action.to_string());
        self.notifications.error(err.user_message());
        Err(err)
    }

    async fn submit_new(&self, form: NewMedicine) -> ClientResult<String> {
        validate_new_medicine(&form)?;

        let mut payload = FormPayload::default();
        for (key, value) in form.form_fields() {
            payload = payload.text(key, value);
        }
        let name = form.name.trim().to_string();
        if let Some(image) = form.image {
            payload = payload.file("image", image);
        }

        let request = ApiRequest::post("/medicines").multipart(payload);
        ensure_success(self.transport.send(request).await?)?;
        Ok(name)
    }

    async fn refresh_list(&self) {
        self.billing.refresh_stock().await;
    }
}
