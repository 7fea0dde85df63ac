//! Depreciation line generation, realization and disposal.
//!
//! Linear plans spread the depreciable base evenly; with prorata temporis the
//! first period is shortened to the time in service and an extra closing
//! period picks up the remainder. Degressive plans apply
//! `coefficient / number_of_depreciation` to the remaining base and switch to
//! linear once that yields more. The last line always closes the plan
//! exactly at the residual value.

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::currency::CurrencyScale;
use crate::error::AccountError;
use crate::fixed_asset::model::{
    DepreciationMethod, DepreciationSettings, FixedAsset, FixedAssetLine, LineStatus,
    PeriodicityType,
};
use crate::fixed_asset::plan::DepreciationPlan;
use crate::types::{Money, Rate};
use crate::AccountResult;

#[derive(Debug, Clone, Default)]
pub struct FixedAssetLineGenerator {
    scale: CurrencyScale,
}

impl FixedAssetLineGenerator {
    pub fn new(scale: CurrencyScale) -> Self {
        FixedAssetLineGenerator { scale }
    }

    /// Full planned schedule of `plan` for `asset`.
    pub fn generate(
        &self,
        asset: &FixedAsset,
        plan: &dyn DepreciationPlan,
    ) -> AccountResult<Vec<FixedAssetLine>> {
        let settings = plan.required_settings(asset)?;
        validate(asset, settings)?;

        let base = asset.depreciable_base();
        if base.is_zero() {
            return Ok(Vec::new());
        }

        let first_prorata = if asset.prorata_temporis {
            self.first_period_prorata(asset, plan, settings)?
        } else {
            Decimal::ONE
        };

        let amounts = match settings.method {
            DepreciationMethod::Linear => self.linear_amounts(asset, settings, first_prorata),
            DepreciationMethod::Degressive => {
                self.degressive_amounts(asset, settings, first_prorata)?
            }
        };

        let mut lines = Vec::with_capacity(amounts.len());
        let mut cumulative = Decimal::ZERO;
        for (k, (depreciation_base, depreciation)) in amounts.into_iter().enumerate() {
            cumulative += depreciation;
            lines.push(FixedAssetLine {
                line_type: plan.line_type(),
                status: LineStatus::Planned,
                depreciation_date: add_months(
                    settings.first_depreciation_date,
                    settings.periodicity_in_month * k as u32,
                )?,
                depreciation_base,
                depreciation,
                cumulative_depreciation: cumulative,
                accounting_value: asset.gross_value - cumulative,
            });
        }

        debug!(
            asset = %asset.name,
            plan = ?plan.line_type(),
            lines = lines.len(),
            "depreciation lines generated"
        );
        Ok(lines)
    }

    /// Replace the plan's planned lines, keeping the realized ones.
    pub fn regenerate(&self, asset: &mut FixedAsset, plan: &dyn DepreciationPlan) -> AccountResult<()> {
        let fresh = self.generate(asset, plan)?;
        let base = asset.depreciable_base();
        let gross = asset.gross_value;

        let lines = plan.lines_mut(asset);
        lines.retain(FixedAssetLine::is_realized);
        let (last_realized_date, mut cumulative) = match lines.last() {
            Some(l) => (Some(l.depreciation_date), l.cumulative_depreciation),
            None => (None, Decimal::ZERO),
        };

        let mut planned: Vec<FixedAssetLine> = fresh
            .into_iter()
            .filter(|l| last_realized_date.map_or(true, |d| l.depreciation_date > d))
            .collect();
        let count = planned.len();
        for (i, line) in planned.iter_mut().enumerate() {
            if i + 1 == count {
                line.depreciation = base - cumulative;
            }
            cumulative += line.depreciation;
            line.cumulative_depreciation = cumulative;
            line.accounting_value = gross - cumulative;
        }

        info!(kept = lines.len(), planned = count, "depreciation plan regenerated");
        lines.extend(planned);
        Ok(())
    }

    /// Mark planned lines dated on or before `until` as realized.
    pub fn realize(&self, asset: &mut FixedAsset, plan: &dyn DepreciationPlan, until: NaiveDate) -> usize {
        let mut count = 0;
        for line in plan
            .lines_mut(asset)
            .iter_mut()
            .filter(|l| !l.is_realized() && l.depreciation_date <= until)
        {
            line.status = LineStatus::Realized;
            count += 1;
        }
        count
    }

    /// Close the plan at `disposal_date`.
    ///
    /// Earlier planned lines are realized, the period containing the disposal
    /// is depreciated pro rata, and later planned lines are dropped.
    pub fn dispose(
        &self,
        asset: &mut FixedAsset,
        plan: &dyn DepreciationPlan,
        disposal_date: NaiveDate,
    ) -> AccountResult<FixedAssetLine> {
        if plan.lines(asset).is_empty() {
            return Err(AccountError::invalid(
                "lines",
                format!("Fixed asset '{}' has no depreciation lines to dispose", asset.name),
            ));
        }
        if disposal_date < asset.first_service_date {
            return Err(AccountError::invalid(
                "disposal_date",
                format!(
                    "Disposal date {disposal_date} precedes first service date {}",
                    asset.first_service_date
                ),
            ));
        }
        if let Some(last) = plan.lines(asset).last() {
            if disposal_date > last.depreciation_date {
                return Err(AccountError::invalid(
                    "disposal_date",
                    format!(
                        "Disposal date {disposal_date} is after the last depreciation line {}",
                        last.depreciation_date
                    ),
                ));
            }
        }
        if let Some(last_realized) = plan.lines(asset).iter().rev().find(|l| l.is_realized()) {
            if disposal_date < last_realized.depreciation_date {
                return Err(AccountError::invalid(
                    "disposal_date",
                    format!(
                        "Depreciation is already realized up to {}",
                        last_realized.depreciation_date
                    ),
                ));
            }
        }

        let before = disposal_date
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| AccountError::DateError(format!("day before {disposal_date}")))?;
        self.realize(asset, plan, before);

        let (previous_date, previous_cumulative) = match plan
            .lines(asset)
            .iter()
            .rev()
            .find(|l| l.is_realized())
        {
            Some(l) => (l.depreciation_date, l.cumulative_depreciation),
            None => (day_before(asset.first_service_date)?, Decimal::ZERO),
        };
        let next_planned = plan
            .lines(asset)
            .iter()
            .find(|l| !l.is_realized())
            .cloned()
            .ok_or_else(|| {
                AccountError::invalid(
                    "disposal_date",
                    format!("Fixed asset '{}' is fully depreciated", asset.name),
                )
            })?;

        let prorata = plan.compute_prorata_between(
            asset,
            &self.scale,
            previous_date,
            disposal_date,
            next_planned.depreciation_date,
        )?;
        let depreciation = self
            .scale
            .scaled(next_planned.depreciation * prorata, &asset.currency);
        let cumulative = previous_cumulative + depreciation;

        let disposal_line = FixedAssetLine {
            line_type: plan.line_type(),
            status: LineStatus::Realized,
            depreciation_date: disposal_date,
            depreciation_base: next_planned.depreciation_base,
            depreciation,
            cumulative_depreciation: cumulative,
            accounting_value: asset.gross_value - cumulative,
        };

        let lines = plan.lines_mut(asset);
        lines.retain(FixedAssetLine::is_realized);
        lines.push(disposal_line.clone());

        info!(
            date = %disposal_date,
            prorata = %prorata,
            depreciation = %depreciation,
            "fixed asset disposed"
        );
        Ok(disposal_line)
    }

    // -----------------------------------------------------------------------
    // Amount schedules: (depreciation base, depreciation) per period
    // -----------------------------------------------------------------------

    fn linear_amounts(
        &self,
        asset: &FixedAsset,
        settings: &DepreciationSettings,
        first_prorata: Rate,
    ) -> Vec<(Money, Money)> {
        let base = asset.depreciable_base();
        let per_period = base / Decimal::from(settings.number_of_depreciation);
        let count = if first_prorata < Decimal::ONE {
            settings.number_of_depreciation + 1
        } else {
            settings.number_of_depreciation
        };

        let mut amounts = Vec::with_capacity(count as usize);
        let mut cumulative = Decimal::ZERO;
        for i in 0..count {
            let depreciation = if i + 1 == count {
                base - cumulative
            } else if i == 0 {
                self.scale.scaled(per_period * first_prorata, &asset.currency)
            } else {
                self.scale.scaled(per_period, &asset.currency)
            };
            cumulative += depreciation;
            amounts.push((base, depreciation));
        }
        amounts
    }

    fn degressive_amounts(
        &self,
        asset: &FixedAsset,
        settings: &DepreciationSettings,
        first_prorata: Rate,
    ) -> AccountResult<Vec<(Money, Money)>> {
        let coefficient = settings.degressive_coefficient.ok_or_else(|| {
            AccountError::invalid(
                "degressive_coefficient",
                "Degressive depreciation requires a coefficient",
            )
        })?;
        let n = settings.number_of_depreciation;
        let rate = coefficient / Decimal::from(n);

        let mut remaining = asset.depreciable_base();
        let mut amounts = Vec::with_capacity(n as usize);
        for i in 0..n {
            let depreciation = if i + 1 == n {
                remaining
            } else {
                let prorata = if i == 0 { first_prorata } else { Decimal::ONE };
                let degressive = remaining * rate * prorata;
                let linear = remaining / Decimal::from(n - i) * prorata;
                self.scale
                    .scaled(degressive.max(linear), &asset.currency)
                    .min(remaining)
            };
            amounts.push((remaining, depreciation));
            remaining -= depreciation;
        }
        Ok(amounts)
    }

    /// Time in service during the first period, service day included.
    fn first_period_prorata(
        &self,
        asset: &FixedAsset,
        plan: &dyn DepreciationPlan,
        settings: &DepreciationSettings,
    ) -> AccountResult<Rate> {
        let period_end = settings.first_depreciation_date;
        let period_start = sub_months(period_end, settings.periodicity_in_month)?;
        let period = plan.day_count(period_start, period_end);
        if period <= 0 {
            return Err(AccountError::DivisionByZero {
                context: format!("first period {period_start} → {period_end}"),
            });
        }
        // 30/360 clamps a 31st to the 30th, so count from the service day itself
        let in_service = (plan.day_count(asset.first_service_date, period_end) + 1).min(period);
        self.scale.ratio(
            Decimal::from(in_service),
            Decimal::from(period),
            "first period prorata",
        )
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(asset: &FixedAsset, settings: &DepreciationSettings) -> AccountResult<()> {
    if asset.gross_value <= Decimal::ZERO {
        return Err(AccountError::invalid(
            "gross_value",
            "Gross value must be positive",
        ));
    }
    if asset.residual_value < Decimal::ZERO || asset.residual_value > asset.gross_value {
        return Err(AccountError::invalid(
            "residual_value",
            "Residual value must lie between zero and the gross value",
        ));
    }
    if settings.number_of_depreciation == 0 {
        return Err(AccountError::invalid(
            "number_of_depreciation",
            "Number of depreciations must be greater than zero",
        ));
    }
    if settings.periodicity_in_month == 0 {
        return Err(AccountError::invalid(
            "periodicity_in_month",
            "Periodicity must be at least one month",
        ));
    }
    if settings.periodicity_type == PeriodicityType::Year && settings.periodicity_in_month % 12 != 0 {
        return Err(AccountError::invalid(
            "periodicity_in_month",
            "Yearly periodicity must be a whole number of years",
        ));
    }
    if settings.first_depreciation_date < asset.first_service_date {
        return Err(AccountError::invalid(
            "first_depreciation_date",
            "First depreciation date precedes the first service date",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Date helpers
// ---------------------------------------------------------------------------

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().is_some_and(|next| next.day() == 1)
}

fn to_month_end(date: NaiveDate) -> Option<NaiveDate> {
    let first_of_next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    first_of_next.and_then(|d| d.pred_opt())
}

/// Shift by whole months, keeping month-end dates on month ends.
fn add_months(date: NaiveDate, months: u32) -> AccountResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .and_then(|d| if is_month_end(date) { to_month_end(d) } else { Some(d) })
        .ok_or_else(|| AccountError::DateError(format!("{date} + {months} months")))
}

fn sub_months(date: NaiveDate, months: u32) -> AccountResult<NaiveDate> {
    date.checked_sub_months(Months::new(months))
        .and_then(|d| if is_month_end(date) { to_month_end(d) } else { Some(d) })
        .ok_or_else(|| AccountError::DateError(format!("{date} - {months} months")))
}

fn day_before(date: NaiveDate) -> AccountResult<NaiveDate> {
    date.pred_opt()
        .ok_or_else(|| AccountError::DateError(format!("day before {date}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_asset::plan::{EconomicPlan, IfrsPlan};
    use crate::types::Currency;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn yearly(method: DepreciationMethod, n: u32) -> DepreciationSettings {
        DepreciationSettings {
            method,
            number_of_depreciation: n,
            periodicity_type: PeriodicityType::Year,
            periodicity_in_month: 12,
            degressive_coefficient: None,
            first_depreciation_date: date(2024, 12, 31),
        }
    }

    fn machine() -> FixedAsset {
        FixedAsset {
            name: "CNC machine".into(),
            currency: Currency::EUR,
            gross_value: dec!(12000),
            residual_value: Decimal::ZERO,
            first_service_date: date(2024, 1, 1),
            prorata_temporis: false,
            economic: yearly(DepreciationMethod::Linear, 4),
            fiscal: None,
            ifrs: None,
            economic_lines: Vec::new(),
            fiscal_lines: Vec::new(),
            ifrs_lines: Vec::new(),
        }
    }

    fn depreciations(lines: &[FixedAssetLine]) -> Vec<Money> {
        lines.iter().map(|l| l.depreciation).collect()
    }

    #[test]
    fn test_linear_schedule_without_prorata() {
        let lines = FixedAssetLineGenerator::default()
            .generate(&machine(), &EconomicPlan)
            .unwrap();

        assert_eq!(depreciations(&lines), vec![dec!(3000); 4]);
        assert_eq!(lines[3].depreciation_date, date(2027, 12, 31));
        assert_eq!(lines[3].accounting_value, Decimal::ZERO);
        assert!(lines.iter().all(|l| l.status == LineStatus::Planned));
    }

    #[test]
    fn test_linear_schedule_with_prorata_adds_closing_period() {
        let mut asset = machine();
        asset.prorata_temporis = true;
        asset.first_service_date = date(2024, 4, 1);

        let lines = FixedAssetLineGenerator::default()
            .generate(&asset, &EconomicPlan)
            .unwrap();

        // 270 / 360 days in service during 2024
        assert_eq!(
            depreciations(&lines),
            vec![dec!(2250), dec!(3000), dec!(3000), dec!(3000), dec!(750)]
        );
        assert_eq!(lines.last().unwrap().cumulative_depreciation, dec!(12000));
    }

    #[test]
    fn test_service_on_the_31st_counts_its_own_day() {
        let mut asset = machine();
        asset.prorata_temporis = true;
        asset.first_service_date = date(2024, 12, 31);

        let lines = FixedAssetLineGenerator::default()
            .generate(&asset, &EconomicPlan)
            .unwrap();

        // 1 / 360 days in service during 2024
        assert_eq!(
            depreciations(&lines),
            vec![dec!(8.33), dec!(3000), dec!(3000), dec!(3000), dec!(2991.67)]
        );
    }

    #[test]
    fn test_month_end_service_date_differs_from_next_month_start() {
        let generator = FixedAssetLineGenerator::default();
        let mut asset = machine();
        asset.prorata_temporis = true;

        asset.first_service_date = date(2024, 3, 31);
        let march_31 = generator.generate(&asset, &EconomicPlan).unwrap();
        asset.first_service_date = date(2024, 3, 30);
        let march_30 = generator.generate(&asset, &EconomicPlan).unwrap();
        asset.first_service_date = date(2024, 4, 1);
        let april_1 = generator.generate(&asset, &EconomicPlan).unwrap();

        // 271 / 360 against 270 / 360
        assert_eq!(march_31[0].depreciation, dec!(2258.33));
        assert_eq!(march_31[0].depreciation, march_30[0].depreciation);
        assert_eq!(april_1[0].depreciation, dec!(2250));
    }

    #[test]
    fn test_computation_scaling_drives_first_prorata() {
        let mut asset = machine();
        asset.prorata_temporis = true;
        asset.first_service_date = date(2024, 12, 31);

        // 1 / 360 rounded to 0.003 instead of 0.0027777778
        let lines = FixedAssetLineGenerator::new(CurrencyScale::with_computation_scaling(3))
            .generate(&asset, &EconomicPlan)
            .unwrap();
        assert_eq!(lines[0].depreciation, dec!(9));
    }

    #[test]
    fn test_service_on_period_start_is_a_full_period() {
        let mut asset = machine();
        asset.prorata_temporis = true;
        let lines = FixedAssetLineGenerator::default()
            .generate(&asset, &EconomicPlan)
            .unwrap();
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_residual_value_is_kept() {
        let mut asset = machine();
        asset.residual_value = dec!(2000);
        let lines = FixedAssetLineGenerator::default()
            .generate(&asset, &EconomicPlan)
            .unwrap();
        assert_eq!(depreciations(&lines), vec![dec!(2500); 4]);
        assert_eq!(lines[3].accounting_value, dec!(2000));
    }

    #[test]
    fn test_degressive_switches_to_linear() {
        let mut asset = machine();
        asset.gross_value = dec!(10000);
        asset.economic = DepreciationSettings {
            degressive_coefficient: Some(dec!(1.75)),
            ..yearly(DepreciationMethod::Degressive, 5)
        };

        let lines = FixedAssetLineGenerator::default()
            .generate(&asset, &EconomicPlan)
            .unwrap();

        assert_eq!(
            depreciations(&lines),
            vec![dec!(3500), dec!(2275), dec!(1478.75), dec!(1373.13), dec!(1373.12)]
        );
        assert_eq!(lines[4].accounting_value, Decimal::ZERO);
        assert_eq!(lines[1].depreciation_base, dec!(6500));
    }

    #[test]
    fn test_degressive_without_coefficient_rejected() {
        let mut asset = machine();
        asset.economic = yearly(DepreciationMethod::Degressive, 5);
        let err = FixedAssetLineGenerator::default()
            .generate(&asset, &EconomicPlan)
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput { .. }));
    }

    #[test]
    fn test_monthly_dates_stay_on_month_end() {
        let mut asset = machine();
        asset.economic = DepreciationSettings {
            periodicity_type: PeriodicityType::Month,
            periodicity_in_month: 1,
            first_depreciation_date: date(2024, 1, 31),
            ..yearly(DepreciationMethod::Linear, 3)
        };
        let lines = FixedAssetLineGenerator::default()
            .generate(&asset, &EconomicPlan)
            .unwrap();
        let dates: Vec<NaiveDate> = lines.iter().map(|l| l.depreciation_date).collect();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]);
    }

    #[test]
    fn test_missing_ifrs_plan() {
        let err = FixedAssetLineGenerator::default()
            .generate(&machine(), &IfrsPlan)
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[test]
    fn test_regenerate_keeps_realized_lines() {
        let generator = FixedAssetLineGenerator::default();
        let mut asset = machine();
        asset.economic_lines = generator.generate(&asset, &EconomicPlan).unwrap();
        assert_eq!(generator.realize(&mut asset, &EconomicPlan, date(2025, 12, 31)), 2);

        asset.economic_lines[1].depreciation = dec!(2900);
        asset.economic_lines[1].cumulative_depreciation = dec!(5900);
        generator.regenerate(&mut asset, &EconomicPlan).unwrap();

        assert_eq!(
            depreciations(&asset.economic_lines),
            vec![dec!(3000), dec!(2900), dec!(3000), dec!(3100)]
        );
        assert_eq!(asset.economic_lines[3].accounting_value, Decimal::ZERO);
    }

    #[test]
    fn test_dispose_mid_period() {
        let generator = FixedAssetLineGenerator::default();
        let mut asset = machine();
        asset.economic_lines = generator.generate(&asset, &EconomicPlan).unwrap();

        let line = generator
            .dispose(&mut asset, &EconomicPlan, date(2025, 6, 30))
            .unwrap();

        assert_eq!(line.depreciation, dec!(1500));
        assert_eq!(line.cumulative_depreciation, dec!(4500));
        assert_eq!(line.accounting_value, dec!(7500));
        assert_eq!(asset.economic_lines.len(), 2);
        assert!(asset.economic_lines.iter().all(FixedAssetLine::is_realized));
    }

    #[test]
    fn test_dispose_before_realized_date_rejected() {
        let generator = FixedAssetLineGenerator::default();
        let mut asset = machine();
        asset.economic_lines = generator.generate(&asset, &EconomicPlan).unwrap();
        generator.realize(&mut asset, &EconomicPlan, date(2025, 12, 31));

        let err = generator
            .dispose(&mut asset, &EconomicPlan, date(2025, 6, 30))
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput { .. }));
    }

    #[test]
    fn test_dispose_after_plan_end_rejected() {
        let generator = FixedAssetLineGenerator::default();
        let mut asset = machine();
        asset.economic_lines = generator.generate(&asset, &EconomicPlan).unwrap();
        let end = asset.economic_lines.last().unwrap().depreciation_date;

        let err = generator
            .dispose(&mut asset, &EconomicPlan, end + chrono::Days::new(1))
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput { .. }));
    }

    #[test]
    fn test_dispose_without_lines_rejected() {
        let err = FixedAssetLineGenerator::default()
            .dispose(&mut machine(), &EconomicPlan, date(2025, 6, 30))
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput { .. }));
    }
}
