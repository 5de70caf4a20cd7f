//! Session bootstrap: merges the secure credential store and the plain
//! preference/cart store into one [`SessionSnapshot`] per app start.

mod bootstrap;
mod loader;
mod snapshot;

pub use bootstrap::{AuthState, BootstrapOutcome};
pub use loader::SessionLoader;
pub use snapshot::{CartItemRef, PlainFields, SecureFields, SessionSnapshot, SnapshotSource};
