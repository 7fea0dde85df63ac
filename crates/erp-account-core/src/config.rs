//! Runtime configuration shared by the calculators.
//!
//! Every field has a default, so an empty YAML/JSON document is a valid
//! configuration.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyScale;
use crate::types::Currency;

/// Decimal places kept on intermediate ratios (company/invoice amounts,
/// paid ratios, prorata).
pub const COMPUTATION_SCALING: u32 = 10;

/// Language used for user-facing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Scale of intermediate ratios
    pub computation_scaling: u32,
    /// Per-currency decimal places overriding the ISO defaults
    pub currency_scales: HashMap<Currency, u32>,
    /// Fixed "today" used for currency conversion dates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<NaiveDate>,
    pub locale: Locale,
}

impl Default for AccountConfig {
    fn default() -> Self {
        AccountConfig {
            computation_scaling: COMPUTATION_SCALING,
            currency_scales: HashMap::new(),
            today: None,
            locale: Locale::default(),
        }
    }
}

impl AccountConfig {
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn currency_scale(&self) -> CurrencyScale {
        let mut scale = CurrencyScale::with_computation_scaling(self.computation_scaling);
        for (currency, places) in &self.currency_scales {
            scale = scale.with_scale(currency.clone(), *places);
        }
        scale
    }
}
