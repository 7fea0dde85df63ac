use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use erp_account_core::fixed_asset::request::{self, DepreciationInput, DisposalInput};
use erp_account_core::fixed_asset::FixedAssetLineType;
use erp_account_core::AccountConfig;

use crate::input;

/// Arguments for depreciation plan generation
#[derive(Args)]
pub struct DepreciationArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Plan to generate (economic, fiscal, ifrs); overrides the input
    #[arg(long)]
    pub plan: Option<String>,

    /// Realize planned lines up to this date (YYYY-MM-DD)
    #[arg(long)]
    pub realize_until: Option<NaiveDate>,
}

/// Arguments for fixed asset disposal
#[derive(Args)]
pub struct DisposeArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Disposal date (YYYY-MM-DD); overrides the input
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

fn parse_plan(plan: &str) -> Result<FixedAssetLineType, Box<dyn std::error::Error>> {
    match plan.to_ascii_lowercase().as_str() {
        "economic" => Ok(FixedAssetLineType::Economic),
        "fiscal" => Ok(FixedAssetLineType::Fiscal),
        "ifrs" => Ok(FixedAssetLineType::Ifrs),
        other => Err(format!("Unknown depreciation plan '{other}' (economic, fiscal, ifrs)").into()),
    }
}

pub fn run_depreciation(
    args: DepreciationArgs,
    config: &AccountConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut depreciation: DepreciationInput = input::load(args.input.as_deref(), "depreciation")?;
    if let Some(ref plan) = args.plan {
        depreciation.plan = parse_plan(plan)?;
    }
    if args.realize_until.is_some() {
        depreciation.realize_until = args.realize_until;
    }
    let result = request::run_depreciation(&depreciation, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_dispose(
    args: DisposeArgs,
    config: &AccountConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    // --date wins over the input file
    let mut value: Value = input::load(args.input.as_deref(), "disposal")?;
    if let (Some(date), Value::Object(map)) = (args.date, &mut value) {
        map.insert("disposal_date".into(), Value::String(date.to_string()));
    }
    let disposal: DisposalInput = serde_json::from_value(value)?;
    let result = request::run_disposal(&disposal, config)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_is_case_insensitive() {
        assert_eq!(parse_plan("IFRS").unwrap(), FixedAssetLineType::Ifrs);
        assert_eq!(parse_plan("fiscal").unwrap(), FixedAssetLineType::Fiscal);
        assert!(parse_plan("derogatory").is_err());
    }
}
