//! Provider configuration and its persisted store.

pub mod provider;
pub mod store;

pub use provider::{ProviderConfig, ProviderKind};
pub use store::{CONFIG_DIR_ENV_VAR, ConfigStore};
