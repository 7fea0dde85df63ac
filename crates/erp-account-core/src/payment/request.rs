//! Serialisable entry points for payment allocation, used by the CLI and
//! the bindings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::AccountConfig;
use crate::currency::{ExchangeRate, RateTable};
use crate::payment::allocation::{AllocationMode, PaymentAllocator};
use crate::payment::discount::StandardFinancialDiscount;
use crate::payment::model::{InvoicePayment, InvoiceTerm, InvoiceTermPayment};
use crate::types::{with_metadata, ComputationOutput, Currency, Money};
use crate::AccountResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    /// Terms to pay, in payment order
    pub terms: Vec<InvoiceTerm>,
    pub available_amount: Money,
    /// Company-currency amount the allocations must add up to; defaults to
    /// the available amount
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reconcile_amount: Option<Money>,
    /// Payment being allocated; previews the allocation when absent
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payment: Option<InvoicePayment>,
    #[serde(default)]
    pub exchange_rates: Vec<ExchangeRate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutput {
    pub mode: String,
    pub records: Vec<InvoiceTermPayment>,
    pub total_paid: Money,
    pub total_company_paid: Money,
    pub total_financial_discount: Money,
    pub unallocated_amount: Money,
    pub rounding_residue: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<InvoicePayment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAmountInput {
    pub payment: InvoicePayment,
    #[serde(default)]
    pub exchange_rates: Vec<ExchangeRate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAmountOutput {
    /// Settled amount in invoice currency, discount included
    pub settled_amount: Money,
    pub invoice_currency: Currency,
    /// Payment amount in payment currency
    pub amount: Money,
    pub currency: Currency,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Allocate an amount across invoice terms, live against the supplied
/// payment or as a preview.
pub fn run_allocation(
    input: &AllocationInput,
    config: &AccountConfig,
) -> AccountResult<ComputationOutput<AllocationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let rates = RateTable::new(input.exchange_rates.clone())?;
    let scale = config.currency_scale();
    let company_currency = input
        .terms
        .first()
        .map(|t| t.company_currency.clone())
        .unwrap_or_default();
    let discount = StandardFinancialDiscount::new(scale.clone(), company_currency);
    let allocator = PaymentAllocator::new(&rates, &scale, &discount, config.today());

    let reconcile_amount = input.reconcile_amount.unwrap_or(input.available_amount);
    let mut payment = input.payment.clone();
    let mode = match payment.as_mut() {
        Some(p) => AllocationMode::Live(p),
        None => AllocationMode::Preview,
    };
    let mode_label = match mode {
        AllocationMode::Live(_) => "live",
        AllocationMode::Preview => "preview",
    };

    let outcome =
        allocator.allocate_with_outcome(&input.terms, input.available_amount, reconcile_amount, mode)?;

    if outcome.unallocated_amount > Decimal::ZERO {
        warnings.push(format!(
            "{} left unallocated after every term was paid",
            outcome.unallocated_amount
        ));
    }
    if !outcome.rounding_residue.is_zero() {
        warnings.push(format!(
            "Rounding residue of {} booked on the last term's company amount",
            outcome.rounding_residue
        ));
    }

    let total_paid: Money = outcome.records.iter().map(|r| r.paid_amount).sum();
    let total_company_paid: Money = outcome.records.iter().map(|r| r.company_paid_amount).sum();
    let total_financial_discount: Money = outcome
        .records
        .iter()
        .map(|r| r.financial_discount_amount)
        .sum();

    let output = AllocationOutput {
        mode: mode_label.to_string(),
        records: outcome.records,
        total_paid,
        total_company_paid,
        total_financial_discount,
        unallocated_amount: outcome.unallocated_amount,
        rounding_residue: outcome.rounding_residue,
        payment,
    };

    let assumptions = serde_json::json!({
        "available_amount": input.available_amount.to_string(),
        "reconcile_amount": reconcile_amount.to_string(),
        "term_count": input.terms.len(),
        "computation_scaling": config.computation_scaling,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sequential invoice term allocation with proportional financial discount",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Recompute a payment's amount from its allocation records.
pub fn run_payment_amount(
    input: &PaymentAmountInput,
    config: &AccountConfig,
) -> AccountResult<ComputationOutput<PaymentAmountOutput>> {
    let start = Instant::now();

    let rates = RateTable::new(input.exchange_rates.clone())?;
    let scale = config.currency_scale();
    // Discount totals are not recomputed here; the calculator only fills the seam
    let discount = StandardFinancialDiscount::new(scale.clone(), Currency::default());
    let allocator = PaymentAllocator::new(&rates, &scale, &discount, config.today());

    let mut payment = input.payment.clone();
    allocator.update_invoice_payment_amount(&mut payment)?;

    let output = PaymentAmountOutput {
        settled_amount: payment.allocated_amount(),
        invoice_currency: payment.invoice_currency.clone(),
        amount: payment.amount,
        currency: payment.currency.clone(),
    };

    let assumptions = serde_json::json!({
        "conversion_date": config.today().to_string(),
        "records": payment.invoice_term_payments.len(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sum of paid and discounted amounts converted to payment currency",
        &assumptions,
        Vec::new(),
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn term_json(id: u64, amount: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "currency": "EUR",
            "company_currency": "EUR",
            "amount": amount,
            "company_amount": amount,
            "amount_remaining": amount,
            "company_amount_remaining": amount
        })
    }

    #[test]
    fn test_preview_from_json() {
        let input: AllocationInput = serde_json::from_value(serde_json::json!({
            "terms": [term_json(1, "600"), term_json(2, "400")],
            "available_amount": "700"
        }))
        .unwrap();

        let out = run_allocation(&input, &AccountConfig::default()).unwrap();
        assert_eq!(out.result.mode, "preview");
        assert_eq!(out.result.records.len(), 2);
        assert_eq!(out.result.total_paid, dec!(700));
        assert_eq!(out.result.records[1].paid_amount, dec!(100));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_leftover_amount_is_warned() {
        let input: AllocationInput = serde_json::from_value(serde_json::json!({
            "terms": [term_json(1, "600")],
            "available_amount": "650"
        }))
        .unwrap();

        let out = run_allocation(&input, &AccountConfig::default()).unwrap();
        assert_eq!(out.result.unallocated_amount, dec!(50));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_payment_amount_in_payment_currency() {
        let input: PaymentAmountInput = serde_json::from_value(serde_json::json!({
            "payment": {
                "amount": "0",
                "currency": "USD",
                "invoice_currency": "EUR",
                "payment_date": "2024-01-15",
                "invoice_term_payments": [
                    {"invoice_term_id": 1, "paid_amount": "60", "company_paid_amount": "60"},
                    {"invoice_term_id": 2, "paid_amount": "40", "company_paid_amount": "40"}
                ]
            },
            "exchange_rates": [
                {"from": "EUR", "to": "USD", "rate": "1.25", "date": "2024-01-01"}
            ]
        }))
        .unwrap();
        let config = AccountConfig {
            today: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..AccountConfig::default()
        };

        let out = run_payment_amount(&input, &config).unwrap();
        assert_eq!(out.result.settled_amount, dec!(100));
        assert_eq!(out.result.amount, dec!(125));
    }
}
