//! Per-plan variations of line generation.
//!
//! The economic and fiscal plans count days on a 30/360 basis; the IFRS
//! plan counts actual calendar days.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::currency::CurrencyScale;
use crate::error::AccountError;
use crate::fixed_asset::model::{
    DepreciationSettings, FixedAsset, FixedAssetLine, FixedAssetLineType, PeriodicityType,
};
use crate::types::Rate;
use crate::AccountResult;

/// Selects the settings, lines and day count of one depreciation plan.
pub trait DepreciationPlan {
    fn line_type(&self) -> FixedAssetLineType;

    fn settings<'a>(&self, asset: &'a FixedAsset) -> Option<&'a DepreciationSettings>;

    fn lines<'a>(&self, asset: &'a FixedAsset) -> &'a [FixedAssetLine];

    fn lines_mut<'a>(&self, asset: &'a mut FixedAsset) -> &'a mut Vec<FixedAssetLine>;

    /// Days between two dates under the plan's convention.
    fn day_count(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        days_360(from, to)
    }

    fn required_settings<'a>(&self, asset: &'a FixedAsset) -> AccountResult<&'a DepreciationSettings> {
        self.settings(asset).ok_or_else(|| {
            AccountError::NotFound(format!(
                "{:?} depreciation plan on fixed asset '{}'",
                self.line_type(),
                asset.name
            ))
        })
    }

    fn periodicity_type(&self, asset: &FixedAsset) -> AccountResult<PeriodicityType> {
        Ok(self.required_settings(asset)?.periodicity_type)
    }

    fn periodicity_in_month(&self, asset: &FixedAsset) -> AccountResult<u32> {
        Ok(self.required_settings(asset)?.periodicity_in_month)
    }

    /// Share of the period `previous_realized → next_planned` elapsed at
    /// `disposal`, clamped to [0, 1].
    fn compute_prorata_between(
        &self,
        _asset: &FixedAsset,
        scale: &CurrencyScale,
        previous_realized: NaiveDate,
        disposal: NaiveDate,
        next_planned: NaiveDate,
    ) -> AccountResult<Rate> {
        let period = self.day_count(previous_realized, next_planned);
        if period <= 0 {
            return Err(AccountError::DivisionByZero {
                context: format!("prorata period {previous_realized} → {next_planned}"),
            });
        }
        let elapsed = self.day_count(previous_realized, disposal).clamp(0, period);
        scale.ratio(
            Decimal::from(elapsed),
            Decimal::from(period),
            "disposal prorata",
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EconomicPlan;

#[derive(Debug, Clone, Copy, Default)]
pub struct FiscalPlan;

#[derive(Debug, Clone, Copy, Default)]
pub struct IfrsPlan;

impl DepreciationPlan for EconomicPlan {
    fn line_type(&self) -> FixedAssetLineType {
        FixedAssetLineType::Economic
    }

    fn settings<'a>(&self, asset: &'a FixedAsset) -> Option<&'a DepreciationSettings> {
        Some(&asset.economic)
    }

    fn lines<'a>(&self, asset: &'a FixedAsset) -> &'a [FixedAssetLine] {
        &asset.economic_lines
    }

    fn lines_mut<'a>(&self, asset: &'a mut FixedAsset) -> &'a mut Vec<FixedAssetLine> {
        &mut asset.economic_lines
    }
}

impl DepreciationPlan for FiscalPlan {
    fn line_type(&self) -> FixedAssetLineType {
        FixedAssetLineType::Fiscal
    }

    fn settings<'a>(&self, asset: &'a FixedAsset) -> Option<&'a DepreciationSettings> {
        asset.fiscal.as_ref()
    }

    fn lines<'a>(&self, asset: &'a FixedAsset) -> &'a [FixedAssetLine] {
        &asset.fiscal_lines
    }

    fn lines_mut<'a>(&self, asset: &'a mut FixedAsset) -> &'a mut Vec<FixedAssetLine> {
        &mut asset.fiscal_lines
    }
}

impl DepreciationPlan for IfrsPlan {
    fn line_type(&self) -> FixedAssetLineType {
        FixedAssetLineType::Ifrs
    }

    fn settings<'a>(&self, asset: &'a FixedAsset) -> Option<&'a DepreciationSettings> {
        asset.ifrs.as_ref()
    }

    fn lines<'a>(&self, asset: &'a FixedAsset) -> &'a [FixedAssetLine] {
        &asset.ifrs_lines
    }

    fn lines_mut<'a>(&self, asset: &'a mut FixedAsset) -> &'a mut Vec<FixedAssetLine> {
        &mut asset.ifrs_lines
    }

    fn day_count(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        (to - from).num_days()
    }
}

pub fn plan_for(line_type: FixedAssetLineType) -> &'static dyn DepreciationPlan {
    match line_type {
        FixedAssetLineType::Economic => &EconomicPlan,
        FixedAssetLineType::Fiscal => &FiscalPlan,
        FixedAssetLineType::Ifrs => &IfrsPlan,
    }
}

/// European 30E/360 day count.
pub(crate) fn days_360(from: NaiveDate, to: NaiveDate) -> i64 {
    let d1 = i64::from(from.day().min(30));
    let d2 = i64::from(to.day().min(30));
    i64::from(to.year() - from.year()) * 360
        + (i64::from(to.month()) - i64::from(from.month())) * 30
        + (d2 - d1)
}
