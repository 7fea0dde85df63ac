use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Currency, Money, Rate};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepreciationMethod {
    Linear,
    Degressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodicityType {
    Year,
    Month,
}

/// Depreciation plan a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedAssetLineType {
    Economic,
    Fiscal,
    Ifrs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    Planned,
    Realized,
}

// ---------------------------------------------------------------------------
// Asset and lines
// ---------------------------------------------------------------------------

/// How one plan depreciates the asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationSettings {
    pub method: DepreciationMethod,
    /// Number of periods
    pub number_of_depreciation: u32,
    pub periodicity_type: PeriodicityType,
    /// Length of one period in months
    pub periodicity_in_month: u32,
    /// Multiplier of the linear rate (degressive only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub degressive_coefficient: Option<Rate>,
    pub first_depreciation_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedAsset {
    pub name: String,
    pub currency: Currency,
    pub gross_value: Money,
    #[serde(default)]
    pub residual_value: Money,
    pub first_service_date: NaiveDate,
    /// Prorate the first period by the time in service
    #[serde(default)]
    pub prorata_temporis: bool,
    pub economic: DepreciationSettings,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fiscal: Option<DepreciationSettings>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ifrs: Option<DepreciationSettings>,
    #[serde(default)]
    pub economic_lines: Vec<FixedAssetLine>,
    #[serde(default)]
    pub fiscal_lines: Vec<FixedAssetLine>,
    #[serde(default)]
    pub ifrs_lines: Vec<FixedAssetLine>,
}

impl FixedAsset {
    /// Amount to spread over the plan.
    pub fn depreciable_base(&self) -> Money {
        self.gross_value - self.residual_value
    }
}

/// One period of a depreciation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedAssetLine {
    pub line_type: FixedAssetLineType,
    pub status: LineStatus,
    pub depreciation_date: NaiveDate,
    pub depreciation_base: Money,
    pub depreciation: Money,
    pub cumulative_depreciation: Money,
    pub accounting_value: Money,
}

impl FixedAssetLine {
    pub fn is_realized(&self) -> bool {
        self.status == LineStatus::Realized
    }
}
