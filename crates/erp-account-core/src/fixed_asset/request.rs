use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::AccountConfig;
use crate::fixed_asset::generator::FixedAssetLineGenerator;
use crate::fixed_asset::model::{FixedAsset, FixedAssetLine, FixedAssetLineType};
use crate::fixed_asset::plan::plan_for;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::AccountResult;

fn default_plan() -> FixedAssetLineType {
    FixedAssetLineType::Economic
}

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationInput {
    pub asset: FixedAsset,
    #[serde(default = "default_plan")]
    pub plan: FixedAssetLineType,
    /// Realize planned lines up to this date after generation
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub realize_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationOutput {
    pub plan: FixedAssetLineType,
    pub lines: Vec<FixedAssetLine>,
    pub total_depreciation: Money,
    pub realized_lines: usize,
    pub final_accounting_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisposalInput {
    pub asset: FixedAsset,
    #[serde(default = "default_plan")]
    pub plan: FixedAssetLineType,
    pub disposal_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisposalOutput {
    pub plan: FixedAssetLineType,
    pub disposal_line: FixedAssetLine,
    pub lines: Vec<FixedAssetLine>,
    pub net_book_value: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate (or regenerate around realized lines) the requested plan.
pub fn run_depreciation(
    input: &DepreciationInput,
    config: &AccountConfig,
) -> AccountResult<ComputationOutput<DepreciationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let generator = FixedAssetLineGenerator::new(config.currency_scale());
    let plan = plan_for(input.plan);
    let mut asset = input.asset.clone();

    if plan.lines(&asset).iter().any(FixedAssetLine::is_realized) {
        warnings.push("Realized lines kept; only planned lines were regenerated".into());
        generator.regenerate(&mut asset, plan)?;
    } else {
        let lines = generator.generate(&asset, plan)?;
        *plan.lines_mut(&mut asset) = lines;
    }
    if let Some(until) = input.realize_until {
        generator.realize(&mut asset, plan, until);
    }

    let lines = plan.lines(&asset).to_vec();
    if lines.is_empty() {
        warnings.push("Depreciable base is zero; no lines generated".into());
    }
    let output = DepreciationOutput {
        plan: input.plan,
        total_depreciation: lines.iter().map(|l| l.depreciation).sum(),
        realized_lines: lines.iter().filter(|l| l.is_realized()).count(),
        final_accounting_value: lines
            .last()
            .map(|l| l.accounting_value)
            .unwrap_or(asset.gross_value),
        lines,
    };

    let settings = plan.required_settings(&asset)?;
    let assumptions = serde_json::json!({
        "method": settings.method,
        "number_of_depreciation": settings.number_of_depreciation,
        "periodicity_in_month": settings.periodicity_in_month,
        "prorata_temporis": asset.prorata_temporis,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed asset depreciation schedule",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Dispose of the asset under one plan, generating the plan first if needed.
pub fn run_disposal(
    input: &DisposalInput,
    config: &AccountConfig,
) -> AccountResult<ComputationOutput<DisposalOutput>> {
    let start = Instant::now();

    let generator = FixedAssetLineGenerator::new(config.currency_scale());
    let plan = plan_for(input.plan);
    let mut asset = input.asset.clone();

    if plan.lines(&asset).is_empty() {
        let lines = generator.generate(&asset, plan)?;
        *plan.lines_mut(&mut asset) = lines;
    }
    let disposal_line = generator.dispose(&mut asset, plan, input.disposal_date)?;

    let output = DisposalOutput {
        plan: input.plan,
        net_book_value: disposal_line.accounting_value,
        disposal_line,
        lines: plan.lines(&asset).to_vec(),
    };

    let assumptions = serde_json::json!({
        "disposal_date": input.disposal_date.to_string(),
        "day_count": if input.plan == FixedAssetLineType::Ifrs { "actual" } else { "30/360" },
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Prorata depreciation up to disposal",
        &assumptions,
        Vec::new(),
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asset_json() -> serde_json::Value {
        serde_json::json!({
            "name": "Delivery van",
            "currency": "EUR",
            "gross_value": "30000",
            "first_service_date": "2024-01-01",
            "economic": {
                "method": "linear",
                "number_of_depreciation": 5,
                "periodicity_type": "year",
                "periodicity_in_month": 12,
                "first_depreciation_date": "2024-12-31"
            },
            "ifrs": {
                "method": "linear",
                "number_of_depreciation": 3,
                "periodicity_type": "year",
                "periodicity_in_month": 12,
                "first_depreciation_date": "2024-12-31"
            }
        })
    }

    #[test]
    fn test_ifrs_plan_from_json() {
        let input: DepreciationInput = serde_json::from_value(serde_json::json!({
            "asset": asset_json(),
            "plan": "ifrs",
            "realize_until": "2024-12-31"
        }))
        .unwrap();

        let out = run_depreciation(&input, &AccountConfig::default()).unwrap();
        assert_eq!(out.result.lines.len(), 3);
        assert_eq!(out.result.lines[0].depreciation, dec!(10000));
        assert_eq!(out.result.total_depreciation, dec!(30000));
        assert_eq!(out.result.realized_lines, 1);
        assert!(out
            .result
            .lines
            .iter()
            .all(|l| l.line_type == FixedAssetLineType::Ifrs));
    }

    #[test]
    fn test_disposal_generates_missing_plan() {
        let input: DisposalInput = serde_json::from_value(serde_json::json!({
            "asset": asset_json(),
            "disposal_date": "2025-06-30"
        }))
        .unwrap();

        let out = run_disposal(&input, &AccountConfig::default()).unwrap();
        assert_eq!(out.result.plan, FixedAssetLineType::Economic);
        assert_eq!(out.result.disposal_line.depreciation, dec!(3000));
        assert_eq!(out.result.net_book_value, dec!(21000));
        assert_eq!(out.result.lines.len(), 2);
    }
}
