use clap::Args;
use serde_json::Value;

use erp_account_core::payment::request::{
    self, AllocationInput, PaymentAmountInput,
};
use erp_account_core::AccountConfig;

use crate::input;

/// Arguments for term allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the available amount of the input
    #[arg(long)]
    pub amount: Option<rust_decimal::Decimal>,
}

/// Arguments for payment amount recomputation
#[derive(Args)]
pub struct PaymentAmountArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_allocate(
    args: AllocateArgs,
    config: &AccountConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut allocation: AllocationInput = input::load(args.input.as_deref(), "allocation")?;
    if let Some(amount) = args.amount {
        allocation.available_amount = amount;
    }
    let result = request::run_allocation(&allocation, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_payment_amount(
    args: PaymentAmountArgs,
    config: &AccountConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let payment: PaymentAmountInput = input::load(args.input.as_deref(), "payment amount")?;
    let result = request::run_payment_amount(&payment, config)?;
    Ok(serde_json::to_value(result)?)
}
