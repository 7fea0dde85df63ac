//! Fixed asset depreciation lines for the economic, fiscal and IFRS plans.

pub mod generator;
pub mod model;
pub mod plan;
pub mod request;

pub use generator::FixedAssetLineGenerator;
pub use model::{
    DepreciationMethod, DepreciationSettings, FixedAsset, FixedAssetLine, FixedAssetLineType,
    LineStatus, PeriodicityType,
};
pub use plan::{plan_for, DepreciationPlan, EconomicPlan, FiscalPlan, IfrsPlan};
