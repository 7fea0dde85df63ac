//! Invoice, term and payment records handled by the allocator.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Currency, Money};

// ---------------------------------------------------------------------------
// Invoice terms
// ---------------------------------------------------------------------------

/// A scheduled obligation amount on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTerm {
    pub id: u64,
    #[serde(default)]
    pub sequence: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<NaiveDate>,
    /// Invoice currency
    pub currency: Currency,
    pub company_currency: Currency,
    /// Amount in invoice currency
    pub amount: Money,
    /// Amount in company currency
    pub company_amount: Money,
    pub amount_remaining: Money,
    pub company_amount_remaining: Money,
    #[serde(default)]
    pub amount_remaining_after_fin_discount: Money,
    #[serde(default)]
    pub financial_discount_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub financial_discount_deadline_date: Option<NaiveDate>,
    #[serde(default)]
    pub apply_financial_discount: bool,
    #[serde(default)]
    pub is_selected_on_payment_session: bool,
    #[serde(default)]
    pub apply_financial_discount_on_payment_session: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub is_hold_back: bool,
}

impl InvoiceTerm {
    /// Invoice and company amounts match, i.e. the invoice is in company currency.
    pub fn is_company_currency(&self) -> bool {
        self.amount == self.company_amount
    }

    pub fn is_partially_paid(&self) -> bool {
        self.amount != self.amount_remaining
    }
}

/// The invoice owning a set of terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub currency: Currency,
    pub company_currency: Currency,
    #[serde(default)]
    pub terms: Vec<InvoiceTerm>,
}

impl Invoice {
    pub fn find_term(&self, id: u64) -> Option<&InvoiceTerm> {
        self.terms.iter().find(|t| t.id == id)
    }

    /// Open terms eligible for automatic payment, by due date then sequence.
    pub fn unpaid_terms_filtered(&self) -> Vec<InvoiceTerm> {
        let mut unpaid: Vec<InvoiceTerm> = self
            .terms
            .iter()
            .filter(|t| !t.is_paid && !t.is_hold_back && t.amount_remaining > Decimal::ZERO)
            .cloned()
            .collect();
        unpaid.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        unpaid
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// What produced an accounting move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalOrigin {
    Sale,
    Purchase,
    Payment,
    Opening,
    Closing,
    FixedAsset,
    Other,
}

/// Matching of a debit line against a credit line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconcile {
    pub debit_move_origin: FunctionalOrigin,
    pub credit_move_origin: FunctionalOrigin,
}

impl Reconcile {
    pub fn is_linked_to_payment(&self) -> bool {
        self.debit_move_origin == FunctionalOrigin::Payment
            || self.credit_move_origin == FunctionalOrigin::Payment
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayVoucherElementToPay {
    pub sequence: u32,
    pub invoice_term_id: u64,
}

/// Payment voucher the payment's move was generated from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentVoucher {
    #[serde(default)]
    pub elements_to_pay: Vec<PayVoucherElementToPay>,
}

/// A payment event against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePayment {
    pub amount: Money,
    /// Payment currency
    pub currency: Currency,
    pub invoice_currency: Currency,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub apply_financial_discount: bool,
    #[serde(default)]
    pub manual_change: bool,
    #[serde(default)]
    pub financial_discount_total_amount: Money,
    #[serde(default)]
    pub total_amount_with_financial_discount: Money,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payment_voucher: Option<PaymentVoucher>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reconcile: Option<Reconcile>,
    #[serde(default)]
    pub invoice_term_payments: Vec<InvoiceTermPayment>,
}

impl InvoicePayment {
    /// Sum of paid and discounted amounts over the allocation records.
    pub fn allocated_amount(&self) -> Money {
        self.invoice_term_payments
            .iter()
            .map(InvoiceTermPayment::settled_amount)
            .sum()
    }
}

/// Allocation of part of a payment to one invoice term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTermPayment {
    pub invoice_term_id: u64,
    /// Paid amount in invoice currency
    pub paid_amount: Money,
    /// Paid amount in company currency
    pub company_paid_amount: Money,
    #[serde(default)]
    pub financial_discount_amount: Money,
}

impl InvoiceTermPayment {
    pub fn new(invoice_term_id: u64, paid_amount: Money) -> Self {
        InvoiceTermPayment {
            invoice_term_id,
            paid_amount,
            company_paid_amount: Decimal::ZERO,
            financial_discount_amount: Decimal::ZERO,
        }
    }

    /// Amount of the term this record settles, discount included.
    pub fn settled_amount(&self) -> Money {
        self.paid_amount + self.financial_discount_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn term(id: u64, sequence: u32, due: Option<NaiveDate>, remaining: Money) -> InvoiceTerm {
        InvoiceTerm {
            id,
            sequence,
            due_date: due,
            currency: Currency::EUR,
            company_currency: Currency::EUR,
            amount: dec!(100),
            company_amount: dec!(100),
            amount_remaining: remaining,
            company_amount_remaining: remaining,
            amount_remaining_after_fin_discount: remaining,
            financial_discount_amount: Decimal::ZERO,
            financial_discount_deadline_date: None,
            apply_financial_discount: false,
            is_selected_on_payment_session: false,
            apply_financial_discount_on_payment_session: false,
            is_paid: remaining.is_zero(),
            is_hold_back: false,
        }
    }

    #[test]
    fn test_unpaid_terms_sorted_by_due_date_then_sequence() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 31);
        let d2 = NaiveDate::from_ymd_opt(2024, 2, 29);
        let mut held = term(4, 0, d1, dec!(100));
        held.is_hold_back = true;
        let invoice = Invoice {
            currency: Currency::EUR,
            company_currency: Currency::EUR,
            terms: vec![
                term(1, 2, d2, dec!(100)),
                term(2, 1, d1, dec!(50)),
                term(3, 0, d2, dec!(100)),
                held,
                term(5, 0, d1, Decimal::ZERO),
            ],
        };
        let ids: Vec<u64> = invoice.unpaid_terms_filtered().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_partially_paid_and_currency_flags() {
        let t = term(1, 0, None, dec!(40));
        assert!(t.is_partially_paid());
        assert!(t.is_company_currency());
    }

    #[test]
    fn test_reconcile_linked_to_payment_on_either_side() {
        let r = Reconcile {
            debit_move_origin: FunctionalOrigin::Sale,
            credit_move_origin: FunctionalOrigin::Payment,
        };
        assert!(r.is_linked_to_payment());
        let r = Reconcile {
            debit_move_origin: FunctionalOrigin::Sale,
            credit_move_origin: FunctionalOrigin::Other,
        };
        assert!(!r.is_linked_to_payment());
    }
}
