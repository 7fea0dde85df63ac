pub mod fixed_asset;
pub mod payment;
