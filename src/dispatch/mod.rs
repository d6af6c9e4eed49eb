//! Request dispatching.
//!
//! # Data Flow
//! ```text
//! TransportRequest + Arc<EndpointDescriptor>
//!     → dispatcher.rs
//!         OPTIONS                → Preflight
//!         method check           → MethodMismatch
//!         Content-Type (POST)    → ContentTypeError
//!         request::load          → schema / payload errors
//!         auth.rs (req_auth)     → NotAuthorized
//!         quota.rs (req_quota)   → RateLimited
//!     → context.rs (RequestContext handed to the handler)
//! ```
//!
//! # Design Decisions
//! - Credentials and quota state sit behind traits so deployments can swap stores
//! - Quota changes are committed only when the call is admitted
//! - Session cookies are only honoured on GET endpoints

pub mod auth;
pub mod context;
pub mod dispatcher;
pub mod quota;

pub use auth::{Authenticator, Caller, StaticAuthenticator};
pub use context::RequestContext;
pub use dispatcher::{Dispatch, DispatchSettings, Dispatcher};
pub use quota::{CallerQuota, MemoryQuotaStore, QuotaError, QuotaStore};
