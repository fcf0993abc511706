//! # authkit
//!
//! Client-side session and access-control core for a single-page
//! application: session lifecycle (login, logout, revalidation), a shared
//! HTTP transport that attaches credentials and classifies failures, and a
//! pure navigation guard enforcing per-route requirements.
//!
//! The view layer stays outside this crate; it supplies the route table and
//! the host capabilities (`Notifier`, `LoginReentry`, `TokenStore`) and
//! reacts to guard decisions and transport outcomes.
//!
//! WIRING
//! ======
//! ```no_run
//! use std::sync::Arc;
//! use authkit::{
//!     FileTokenStore, Session, TracingNotifier, Transport, TransportConfig,
//! };
//!
//! struct Reload;
//! impl authkit::LoginReentry for Reload {
//!     fn reenter_login(&self) { /* host navigates to its login entry */ }
//! }
//!
//! # fn main() -> Result<(), authkit::TransportError> {
//! let store: Arc<dyn authkit::TokenStore> =
//!     Arc::new(FileTokenStore::new("session.token"));
//! let session = Session::init(store.clone());
//! let transport = Transport::new(
//!     &TransportConfig::from_env(),
//!     session.clone(),
//!     store,
//!     Arc::new(TracingNotifier),
//!     Arc::new(Reload),
//! )?;
//! # let _ = (session, transport);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod guard;
pub mod host;
pub mod session;
pub mod storage;
pub mod transport;

pub use error::{LoginError, TransportError};
pub use guard::{GuardDecision, RouteRequirement, RouteTable, decide};
pub use host::{LoginReentry, Notifier, TracingNotifier};
pub use session::{ADMIN_ROLE, Credentials, Session, SessionSnapshot, User};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{DEV_BASE_URL, PROD_BASE_URL, Transport, TransportConfig};
