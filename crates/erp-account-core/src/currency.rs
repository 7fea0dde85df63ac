//! Currency-scaled rounding and dated currency conversion.
//!
//! Amounts are rounded half-up (midpoint away from zero) to the number of
//! decimal places of their currency. Ratios between amounts are kept at the
//! computation scaling.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::COMPUTATION_SCALING;
use crate::error::AccountError;
use crate::types::{Currency, Money, Rate};
use crate::AccountResult;

// ---------------------------------------------------------------------------
// Scaling
// ---------------------------------------------------------------------------

/// Per-currency rounding rules.
#[derive(Debug, Clone)]
pub struct CurrencyScale {
    computation_scaling: u32,
    overrides: HashMap<Currency, u32>,
}

impl Default for CurrencyScale {
    fn default() -> Self {
        Self::with_computation_scaling(COMPUTATION_SCALING)
    }
}

impl CurrencyScale {
    pub fn with_computation_scaling(computation_scaling: u32) -> Self {
        CurrencyScale {
            computation_scaling,
            overrides: HashMap::new(),
        }
    }

    pub fn with_scale(mut self, currency: Currency, places: u32) -> Self {
        self.overrides.insert(currency, places);
        self
    }

    pub fn places(&self, currency: &Currency) -> u32 {
        self.overrides
            .get(currency)
            .copied()
            .unwrap_or_else(|| currency.default_scale())
    }

    /// Round `amount` half-up to the decimal places of `currency`.
    pub fn scaled(&self, amount: Money, currency: &Currency) -> Money {
        round_half_up(amount, self.places(currency))
    }

    /// `numerator / denominator` rounded half-up at the computation scaling.
    pub fn ratio(&self, numerator: Decimal, denominator: Decimal, context: &str) -> AccountResult<Rate> {
        if denominator.is_zero() {
            return Err(AccountError::DivisionByZero {
                context: context.to_string(),
            });
        }
        let quotient = numerator
            .checked_div(denominator)
            .ok_or_else(|| AccountError::DivisionByZero {
                context: context.to_string(),
            })?;
        Ok(round_half_up(quotient, self.computation_scaling))
    }
}

pub(crate) fn round_half_up(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Converts an amount between currencies as of a date.
pub trait CurrencyConverter {
    fn convert(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Money,
        date: NaiveDate,
    ) -> AccountResult<Money>;
}

/// One quoted rate: 1 `from` = `rate` `to`, valid from `date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: Rate,
    pub date: NaiveDate,
}

/// In-memory table of dated exchange rates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateTable {
    rates: Vec<ExchangeRate>,
}

impl RateTable {
    pub fn new(rates: Vec<ExchangeRate>) -> AccountResult<Self> {
        for r in &rates {
            if r.rate <= Decimal::ZERO {
                return Err(AccountError::invalid(
                    "exchange_rates.rate",
                    format!("Rate {}→{} on {} must be positive", r.from, r.to, r.date),
                ));
            }
        }
        Ok(RateTable { rates })
    }

    /// Latest quote for the pair dated on or before `date`.
    fn latest(&self, from: &Currency, to: &Currency, date: NaiveDate) -> Option<&ExchangeRate> {
        self.rates
            .iter()
            .filter(|r| &r.from == from && &r.to == to && r.date <= date)
            .max_by_key(|r| r.date)
    }
}

impl CurrencyConverter for RateTable {
    fn convert(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Money,
        date: NaiveDate,
    ) -> AccountResult<Money> {
        if from == to || amount.is_zero() {
            return Ok(amount);
        }
        if let Some(quote) = self.latest(from, to, date) {
            debug!(%from, %to, rate = %quote.rate, quoted_on = %quote.date, "direct rate");
            return Ok(amount * quote.rate);
        }
        if let Some(quote) = self.latest(to, from, date) {
            debug!(%from, %to, rate = %quote.rate, quoted_on = %quote.date, "inverse rate");
            return Ok(amount / quote.rate);
        }
        Err(AccountError::CurrencyConversion {
            from: from.clone(),
            to: to.clone(),
            date,
        })
    }
}
