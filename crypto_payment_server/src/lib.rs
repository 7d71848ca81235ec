//! # Crypto payment gateway server
//! This crate hosts the HTTP front door of the gateway. It is responsible for:
//! * Placing crypto payments for storefront orders, at the current exchange rate.
//! * Showing display-only quotes and payment instructions.
//! * Letting customers check on their own payments.
//! * Offering the reconciliation sweeper an organic trigger on every page load.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/storefront/checkout`: Storefront-signed checkout. Creates the order if needed and fixes the crypto amount.
//! * `/rate/{currency}?fiat_total=`: A display quote.
//! * `/order/{order_id}/instructions`: Payment instructions for an order (customer-signed).
//! * `/order/{order_id}/check`: On-demand reconciliation of an order (customer-signed).
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod hooks;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
