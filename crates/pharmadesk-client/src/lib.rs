//! # PharmaDesk Client
//!
//! Everything that talks to the outside world: the REST backend, the session
//! file, the clock. Business rules stay in `pharmadesk-core`.
//!
//! ## Module Organization
//! ```text
//! pharmadesk_client/
//! ├── lib.rs        ◄─── You are here
//! ├── config.rs     ◄─── TOML config + environment overrides
//! ├── error.rs      ◄─── ClientError and its taxonomy
//! ├── session.rs    ◄─── Bearer token, signed-in user, auth events
//! ├── transport.rs  ◄─── Transport trait + reqwest implementation
//! ├── notify.rs     ◄─── Toasts with auto-dismiss
//! ├── confirm.rs    ◄─── Single-pending yes/no prompts
//! ├── catalog.rs    ◄─── Medicine snapshot + debounced search
//! ├── billing.rs    ◄─── Cart orchestration and checkout
//! ├── inventory.rs  ◄─── Add/delete medicines
//! ├── reports.rs    ◄─── Sales, inventory, profit, expiry reports
//! ├── auth.rs       ◄─── Login, logout, access check
//! └── context.rs    ◄─── AppContext wiring
//! ```
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  front-end (terminal, webview) ── reads snapshots, toasts, prompts     │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  BillingDesk / MedicineAdmin / ReportsClient / AuthService             │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  Transport ──► HTTP backend          pharmadesk-core (pure rules)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod confirm;
pub mod context;
pub mod error;
pub mod inventory;
pub mod notify;
pub mod reports;
pub mod session;
pub mod transport;

pub use auth::AuthService;
pub use billing::BillingDesk;
pub use catalog::CatalogCache;
pub use config::ClientConfig;
pub use confirm::{ConfirmPrompt, ConfirmationService};
pub use context::AppContext;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use inventory::MedicineAdmin;
pub use notify::{NotificationCenter, NotificationId, Severity, Toast, ToastEvent};
pub use reports::ReportsClient;
pub use session::{AuthState, SessionStore, SignOutReason};
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
