//! Library exports for the storefront session core, shared between the edge binary and tests.

pub mod api;
pub mod config;
pub mod features;
pub mod gate;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod session;
pub mod startup;
pub mod state;
pub mod utils;
