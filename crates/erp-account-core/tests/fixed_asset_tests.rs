use chrono::NaiveDate;
use erp_account_core::fixed_asset::request::{
    run_depreciation, run_disposal, DepreciationInput, DisposalInput,
};
use erp_account_core::fixed_asset::{
    DepreciationMethod, DepreciationSettings, FixedAsset, FixedAssetLineType, LineStatus,
    PeriodicityType,
};
use erp_account_core::{AccountConfig, AccountError, Currency};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn machine() -> FixedAsset {
    FixedAsset {
        name: "Milling machine".into(),
        currency: Currency::EUR,
        gross_value: dec!(10000),
        residual_value: Decimal::ZERO,
        first_service_date: date(2024, 1, 1),
        prorata_temporis: false,
        economic: DepreciationSettings {
            method: DepreciationMethod::Linear,
            number_of_depreciation: 4,
            periodicity_type: PeriodicityType::Year,
            periodicity_in_month: 12,
            degressive_coefficient: None,
            first_depreciation_date: date(2024, 12, 31),
        },
        fiscal: None,
        ifrs: None,
        economic_lines: Vec::new(),
        fiscal_lines: Vec::new(),
        ifrs_lines: Vec::new(),
    }
}

#[test]
fn test_linear_schedule_reaches_zero() {
    let input = DepreciationInput {
        asset: machine(),
        plan: FixedAssetLineType::Economic,
        realize_until: None,
    };

    let out = run_depreciation(&input, &AccountConfig::default()).unwrap();
    let values: Vec<Decimal> = out.result.lines.iter().map(|l| l.accounting_value).collect();

    assert_eq!(values, vec![dec!(7500), dec!(5000), dec!(2500), dec!(0)]);
    assert_eq!(out.result.total_depreciation, dec!(10000));
    assert_eq!(out.result.final_accounting_value, Decimal::ZERO);
    assert_eq!(out.result.realized_lines, 0);
}

#[test]
fn test_realize_then_dispose_mid_period() {
    let generated = run_depreciation(
        &DepreciationInput {
            asset: machine(),
            plan: FixedAssetLineType::Economic,
            realize_until: Some(date(2025, 12, 31)),
        },
        &AccountConfig::default(),
    )
    .unwrap();
    assert_eq!(generated.result.realized_lines, 2);

    let asset = FixedAsset {
        economic_lines: generated.result.lines,
        ..machine()
    };
    let out = run_disposal(
        &DisposalInput {
            asset,
            plan: FixedAssetLineType::Economic,
            disposal_date: date(2026, 6, 30),
        },
        &AccountConfig::default(),
    )
    .unwrap();
    let result = &out.result;

    assert_eq!(result.disposal_line.depreciation, dec!(1250));
    assert_eq!(result.disposal_line.cumulative_depreciation, dec!(6250));
    assert_eq!(result.net_book_value, dec!(3750));
    assert_eq!(result.lines.len(), 3);
    assert!(result.lines.iter().all(|l| l.status == LineStatus::Realized));
}

#[test]
fn test_regeneration_keeps_realized_lines() {
    let generated = run_depreciation(
        &DepreciationInput {
            asset: machine(),
            plan: FixedAssetLineType::Economic,
            realize_until: Some(date(2024, 12, 31)),
        },
        &AccountConfig::default(),
    )
    .unwrap();

    // Gross value raised after the first year was booked
    let asset = FixedAsset {
        gross_value: dec!(13000),
        economic_lines: generated.result.lines,
        ..machine()
    };
    let out = run_depreciation(
        &DepreciationInput {
            asset,
            plan: FixedAssetLineType::Economic,
            realize_until: None,
        },
        &AccountConfig::default(),
    )
    .unwrap();
    let result = &out.result;

    assert_eq!(result.lines[0].depreciation, dec!(2500));
    assert!(result.lines[0].is_realized());
    assert_eq!(result.total_depreciation, dec!(13000));
    assert_eq!(result.final_accounting_value, Decimal::ZERO);
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_missing_fiscal_plan_is_not_found() {
    let input = DepreciationInput {
        asset: machine(),
        plan: FixedAssetLineType::Fiscal,
        realize_until: None,
    };
    let err = run_depreciation(&input, &AccountConfig::default()).unwrap_err();
    assert!(matches!(err, AccountError::NotFound(_)));
}
