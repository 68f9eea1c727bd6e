pub mod catalog;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod settings;
pub mod store;

pub use catalog::{CatalogClient, CatalogError, ProductCandidate, ProductInfo};
pub use config::Config;
pub use error::StoreError;
pub use model::*;
pub use settings::{EnvSettings, FixedSettings, SettingsSource};
pub use store::{PriceHistoryStore, ProductStore, SubscriptionStore};
