//! # Deep-link routing
//!
//! Turns raw URIs from the platform into validated [`DeepLinkEvent`]s and
//! delivers them to registered listeners.
//!
//! 1. **Two schemes**: custom scheme and https universal links share one
//!    `(route, params)` shape.
//! 2. **Validation boundary**: malformed identifiers are redirected to the
//!    synthetic `fallback` route and never reach navigation code.
//! 3. **Nothing is lost**: intents raised before any listener exists are
//!    queued and replayed on foreground resume or late registration.

mod decode;
pub mod parser;
pub mod router;
pub mod source;
pub mod types;
pub mod validate;

pub use parser::{build_link, DeepLinkParser};
pub use router::{DeepLinkRouter, ListenerHandle};
pub use source::{AppLifecycleState, LifecycleSource, LinkOpener, LinkSource};
pub use types::{
    DeepLinkEvent, KnownRoute, LinkOrigin, PendingAction, PendingPayload, RouterPhase,
    RouterStatus,
};
pub use validate::{validate_event, Rejection, RejectionReason};
