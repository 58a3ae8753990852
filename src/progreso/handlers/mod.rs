//! HTTP handlers for the service endpoints.

pub(crate) mod health;
pub(crate) mod login;
pub(crate) mod progress;
pub(crate) mod proxy;
pub(crate) mod register;
pub(crate) mod types;

pub use proxy::ProxyState;
