use erp_account_core::AccountConfig;
use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Defaults apply when no configuration JSON is passed.
fn read_config(config_json: Option<String>) -> NapiResult<AccountConfig> {
    match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(AccountConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[napi]
pub fn allocate_payment(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: erp_account_core::payment::request::AllocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = read_config(config_json)?;
    let output = erp_account_core::payment::request::run_allocation(&input, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_payment_amount(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let input: erp_account_core::payment::request::PaymentAmountInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = read_config(config_json)?;
    let output = erp_account_core::payment::request::run_payment_amount(&input, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Fixed assets
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_depreciation(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let input: erp_account_core::fixed_asset::request::DepreciationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = read_config(config_json)?;
    let output = erp_account_core::fixed_asset::request::run_depreciation(&input, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn dispose_fixed_asset(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: erp_account_core::fixed_asset::request::DisposalInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = read_config(config_json)?;
    let output = erp_account_core::fixed_asset::request::run_disposal(&input, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
