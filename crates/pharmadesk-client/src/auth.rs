//! # Authentication
//!
//! Login, logout and the access check run on every screen.
//!
//! ```text
//! login(email, pw) ──► POST /auth/login ──► {token, user} ──► SessionStore
//! logout()         ──► "Logout Confirmation" ──► yes ──► force_logout
//! check_access()   ──► token missing/expired ──► force_logout(Expired)
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use pharmadesk_core::validation::validate_credentials;
use pharmadesk_core::UserProfile;

use crate::confirm::ConfirmationService;
use crate::error::ClientResult;
use crate::session::{SessionStore, SignOutReason};
use crate::transport::{ApiRequest, Transport};

pub const LOGOUT_PROMPT: &str = "Are you sure you want to log out?";
pub const LOGOUT_TITLE: &str = "Logout Confirmation";

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    user: UserProfile,
}

pub struct AuthService<T: Transport> {
    transport: Arc<T>,
    session: Arc<SessionStore>,
    confirmations: Arc<ConfirmationService>,
}

impl<T: Transport> AuthService<T> {
    pub fn new(
        transport: Arc<T>,
        session: Arc<SessionStore>,
        confirmations: Arc<ConfirmationService>,
    ) -> Self {
        AuthService {
            transport,
            session,
            confirmations,
        }
    }

    /// Signs in and stores the session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        validate_credentials(email, password)?;
        let email = email.trim();

        let request = ApiRequest::post("/auth/login").json(&Credentials { email, password })?;
        let data: LoginData = match self.transport.data(request).await {
            Ok(data) => data,
            Err(err) => {
                warn!(email, error = %err, "Login failed");
                return Err(err);
            }
        };

        self.session.sign_in(data.token, data.user.clone())?;
        Ok(data.user)
    }

    /// Signs out if the user confirms.
    pub async fn logout(&self) -> bool {
        if !self.confirmations.confirm(LOGOUT_PROMPT, Some(LOGOUT_TITLE)).await {
            return false;
        }
        self.session.force_logout(SignOutReason::UserRequested);
        true
    }

    /// Returns false, and signs out, when there is no usable session.
    pub fn check_access(&self) -> bool {
        if self.session.is_valid() {
            return true;
        }
        if self.session.force_logout(SignOutReason::Expired) {
            info!("Session expired");
        }
        false
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.user()
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, ErrorKind};
    use crate::session::fixtures::{token, user};
    use crate::session::AuthState;
    use crate::transport::fake::{ok, FakeTransport};
    use crate::transport::RequestBody;
    use pharmadesk_core::Role;
    use serde_json::json;

    fn service(transport: Arc<FakeTransport>) -> Arc<AuthService<FakeTransport>> {
        Arc::new(AuthService::new(
            transport,
            Arc::new(SessionStore::in_memory()),
            Arc::new(ConfirmationService::new()),
        ))
    }

    fn login_backend(token: String) -> Arc<FakeTransport> {
        Arc::new(FakeTransport::new(move |request| {
            let RequestBody::Json(body) = &request.body else {
                return Err(ClientError::Network("expected json".to_string()));
            };
            if body["password"] == "secret" {
                ok(json!({
                    "token": token,
                    "user": {
                        "user_id": 3,
                        "full_name": "Ravi Sharma",
                        "email": body["email"],
                        "role": "subadmin",
                        "image_url": "None"
                    }
                }))
            } else {
                Err(ClientError::Api {
                    status: 401,
                    message: "Invalid email or password".to_string(),
                })
            }
        }))
    }

    #[tokio::test]
    async fn test_login_stores_session() {
        let auth = service(login_backend(token(3600)));
        let mut events = auth.session().subscribe();

        let profile = auth.login(" ravi@pharmadesk.in ", "secret").await.unwrap();
        assert_eq!(profile.role, Role::Subadmin);
        assert_eq!(profile.email.as_deref(), Some("ravi@pharmadesk.in"));
        assert_eq!(profile.avatar_url(), None);

        assert!(auth.check_access());
        assert_eq!(auth.current_user().unwrap().full_name, "Ravi Sharma");
        assert!(events.borrow_and_update().is_signed_in());
    }

    #[tokio::test]
    async fn test_login_failure_returns_server_message() {
        let auth = service(login_backend(token(3600)));

        let err = auth.login("ravi@pharmadesk.in", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_bad_credentials_are_not_sent() {
        let transport = login_backend(token(3600));
        let auth = service(transport.clone());

        let err = auth.login("not-an-email", "secret").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(auth.login("a@b.in", "").await.is_err());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_is_signed_out() {
        let auth = service(login_backend(token(-60)));
        auth.login("ravi@pharmadesk.in", "secret").await.unwrap();

        assert!(!auth.check_access());
        assert!(auth.current_user().is_none());
        assert_eq!(
            *auth.session().subscribe().borrow(),
            AuthState::SignedOut {
                reason: Some(SignOutReason::Expired)
            }
        );

        // already signed out: still denied, nothing new published
        assert!(!auth.check_access());
    }

    #[tokio::test]
    async fn test_logout_asks_first() {
        let auth = service(Arc::new(FakeTransport::new(|_| ok(json!(null)))));
        auth.session().sign_in(token(3600), user(Role::Staff)).unwrap();

        for answer in [false, true] {
            let task = {
                let auth = auth.clone();
                tokio::spawn(async move { auth.logout().await })
            };
            let mut prompts = auth.confirmations.watch();
            let prompt = loop {
                if let Some(p) = prompts.borrow_and_update().clone() {
                    break p;
                }
                prompts.changed().await.unwrap();
            };
            assert_eq!(prompt.title, LOGOUT_TITLE);
            assert_eq!(prompt.message, LOGOUT_PROMPT);

            auth.confirmations.respond(answer).unwrap();
            assert_eq!(task.await.unwrap(), answer);
            assert_eq!(auth.current_user().is_none(), answer);
        }
    }
}
