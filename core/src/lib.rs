pub mod api;
pub mod config;
pub mod deeplink;
pub mod error;
pub mod session;
pub mod store;
