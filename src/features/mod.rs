//! Typed calls to the backend endpoints, built on the shared [`ApiClient`].
//!
//! [`ApiClient`]: crate::api::ApiClient
pub mod auth;
pub mod catalog;
pub mod orders;

pub use auth::{AuthApi, AuthSession};
pub use catalog::CatalogApi;
pub use orders::{CheckoutApi, OrderApi};
