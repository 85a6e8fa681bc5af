// Wire types exchanged with the storefront backend.
pub mod auth;
pub mod catalog;
pub mod envelope;
pub mod orders;

pub use auth::{AuthResponse, LoginRequest, RefreshResponse, RegisterRequest};
pub use catalog::{Category, Product, ProductQuery};
pub use envelope::ApiEnvelope;
pub use orders::{CheckoutItem, CheckoutRequest, Order, ShippingAddress};
