pub mod factory;
pub mod link;
pub mod store;
