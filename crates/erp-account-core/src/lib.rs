pub mod config;
pub mod currency;
pub mod error;
pub mod types;

#[cfg(feature = "payment")]
pub mod payment;

#[cfg(feature = "fixed_asset")]
pub mod fixed_asset;

#[cfg(feature = "indicator")]
pub mod indicator;

pub use config::{AccountConfig, Locale};
pub use error::AccountError;
pub use types::*;

/// Standard result type for all erp-account operations
pub type AccountResult<T> = Result<T, AccountError>;
