//! # Crypto payment engine public API
//!
//! * [`checkout_api`] fixes the expected payment for an order at checkout time, and provides display-only quotes.
//! * [`reconcile_api`] reconciles pending orders with what the chain adapters report, one order at a time.
//! * [`sweeper`] runs throttled sweeps of every pending order through the reconciler.
//!
//! Each API is created by supplying a backend that implements [`crate::traits::OrderStore`]:
//!
//! ```rust,ignore
//! let db = SqliteDatabase::new_with_url(url, 5).await?;
//! let adapters = AdapterRegistry::with_explorers(ExplorerConfig::new_from_env_or_default())?;
//! let api = ReconcileApi::new(db, adapters, EventProducers::default());
//! let result = api.check_order(&OrderId::new("1001")).await?;
//! ```
pub mod checkout_api;
pub mod errors;
pub mod merchant_config;
pub mod payment_objects;
pub mod reconcile_api;
pub mod sweeper;
