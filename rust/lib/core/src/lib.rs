pub mod config;
pub mod error;
pub mod types;

pub use config::{ModelConfig, StorageConfig, StoreConfig};
pub use error::ServiceError;
pub use types::{format_timestamp, merge_patch, new_id};
