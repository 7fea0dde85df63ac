//! Allocation of a payment amount across an ordered list of invoice terms.
//!
//! Terms are paid one after the other until the available amount runs out.
//! Fully paid terms may carry an early-payment financial discount, and each
//! allocation is converted to company currency using the term's own
//! company/invoice ratio. Once the available amount is exhausted, any
//! conversion drift against the reconciled amount is booked on the last
//! allocation's company amount.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::currency::{CurrencyConverter, CurrencyScale};
use crate::error::AccountError;
use crate::payment::discount::FinancialDiscountCalculator;
use crate::payment::model::{Invoice, InvoicePayment, InvoiceTerm, InvoiceTermPayment, Reconcile};
use crate::types::Money;
use crate::AccountResult;

/// Whether the allocation runs against a real payment or only previews it.
#[derive(Debug)]
pub enum AllocationMode<'p> {
    /// Terms are paid strictly in list order and the records are attached
    /// to the payment.
    Live(&'p mut InvoicePayment),
    /// No payment yet: a term matching the available amount exactly is
    /// preferred over list order.
    Preview,
}

/// Records produced by one allocation run with the leftovers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub records: Vec<InvoiceTermPayment>,
    /// Available amount left once every term was visited
    pub unallocated_amount: Money,
    /// Correction added to the last record's company amount
    pub rounding_residue: Money,
}

/// Distributes payments over invoice terms.
pub struct PaymentAllocator<'a> {
    converter: &'a dyn CurrencyConverter,
    scale: &'a CurrencyScale,
    discount: &'a dyn FinancialDiscountCalculator,
    today: NaiveDate,
}

impl<'a> PaymentAllocator<'a> {
    pub fn new(
        converter: &'a dyn CurrencyConverter,
        scale: &'a CurrencyScale,
        discount: &'a dyn FinancialDiscountCalculator,
        today: NaiveDate,
    ) -> Self {
        PaymentAllocator {
            converter,
            scale,
            discount,
            today,
        }
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Replace the payment's records with one full-remaining record per term.
    pub fn init_invoice_term_payments(
        &self,
        payment: &mut InvoicePayment,
        terms: &[InvoiceTerm],
    ) -> AccountResult<()> {
        payment.invoice_term_payments.clear();

        let Some(first) = terms.first() else {
            return Ok(());
        };
        validate_terms(terms)?;

        let is_company_currency = payment.currency == first.company_currency;
        for term in terms {
            let paid = if is_company_currency {
                self.scale
                    .scaled(term.company_amount_remaining, &term.company_currency)
            } else {
                self.scale.scaled(term.amount_remaining, &term.currency)
            };
            let record = self.create_invoice_term_payment(Some(&mut *payment), term, paid)?;
            payment.invoice_term_payments.push(record);
        }
        Ok(())
    }

    /// Allocate the payment's amount to the terms it is meant to settle.
    ///
    /// The terms come from `terms_to_pay` when given, else from the payment
    /// voucher in element order, else from the invoice's open terms.
    pub fn create_invoice_payment_terms(
        &self,
        payment: &mut InvoicePayment,
        invoice: &Invoice,
        terms_to_pay: &[InvoiceTerm],
    ) -> AccountResult<()> {
        if invoice.terms.is_empty() {
            return Ok(());
        }

        let terms: Vec<InvoiceTerm> = if !terms_to_pay.is_empty() {
            terms_to_pay.to_vec()
        } else if let Some(voucher) = payment
            .payment_voucher
            .as_ref()
            .filter(|v| !v.elements_to_pay.is_empty())
        {
            let mut elements = voucher.elements_to_pay.clone();
            elements.sort_by_key(|e| e.sequence);
            elements
                .iter()
                .map(|e| {
                    invoice.find_term(e.invoice_term_id).cloned().ok_or_else(|| {
                        AccountError::NotFound(format!(
                            "invoice term {} referenced by payment voucher",
                            e.invoice_term_id
                        ))
                    })
                })
                .collect::<AccountResult<_>>()?
        } else {
            invoice.unpaid_terms_filtered()
        };

        if !terms.is_empty() {
            let amount = payment.amount;
            self.allocate(&terms, amount, amount, AllocationMode::Live(payment))?;
        }
        Ok(())
    }

    /// Allocate `available_amount` across `terms`, returning the records in
    /// allocation order.
    pub fn allocate(
        &self,
        terms: &[InvoiceTerm],
        available_amount: Money,
        reconcile_amount: Money,
        mode: AllocationMode<'_>,
    ) -> AccountResult<Vec<InvoiceTermPayment>> {
        self.allocate_with_outcome(terms, available_amount, reconcile_amount, mode)
            .map(|outcome| outcome.records)
    }

    /// Same as [`allocate`](Self::allocate), also reporting what was left over.
    pub fn allocate_with_outcome(
        &self,
        terms: &[InvoiceTerm],
        available_amount: Money,
        reconcile_amount: Money,
        mode: AllocationMode<'_>,
    ) -> AccountResult<AllocationOutcome> {
        validate_terms(terms)?;

        let mut payment = match mode {
            AllocationMode::Live(payment) => {
                payment.invoice_term_payments.clear();
                Some(payment)
            }
            AllocationMode::Preview => None,
        };
        let live = payment.is_some();

        let base_available = available_amount;
        let mut available = available_amount;
        let mut records: Vec<InvoiceTermPayment> = Vec::with_capacity(terms.len());
        let mut pending: Vec<&InvoiceTerm> = terms.iter().collect();
        let mut last_term: Option<&InvoiceTerm> = None;

        while !pending.is_empty() && available > Decimal::ZERO {
            let term = pending.remove(next_term_index(live, &pending, available));

            let term_remaining = if term.is_company_currency() {
                self.scale
                    .scaled(term.amount_remaining, &term.company_currency)
            } else {
                self.scale.scaled(term.amount_remaining, &term.currency)
            };

            let paid = if term_remaining >= available {
                std::mem::replace(&mut available, Decimal::ZERO)
            } else {
                available -= term_remaining;
                term_remaining
            };

            let record = self.create_invoice_term_payment(payment.as_deref_mut(), term, paid)?;
            debug!(
                term_id = term.id,
                paid = %record.paid_amount,
                company_paid = %record.company_paid_amount,
                discount = %record.financial_discount_amount,
                available = %available,
                "term allocated"
            );

            if let Some(p) = payment.as_deref_mut() {
                p.invoice_term_payments.push(record.clone());

                if p.apply_financial_discount && !p.manual_change {
                    let previous_amount = p.amount + p.financial_discount_total_amount;
                    self.discount.compute_financial_discount(p)?;
                    available = base_available - p.allocated_amount();
                    p.amount = self.scale.scaled(
                        previous_amount - p.financial_discount_total_amount,
                        &term.company_currency,
                    );
                    p.total_amount_with_financial_discount = self.scale.scaled(
                        p.amount + p.financial_discount_total_amount,
                        &term.company_currency,
                    );
                }
            }

            records.push(record);
            last_term = Some(term);
        }

        let mut rounding_residue = Decimal::ZERO;
        if base_available != reconcile_amount && available <= Decimal::ZERO {
            if let Some(term) = last_term {
                let total_company: Money = records.iter().map(|r| r.company_paid_amount).sum();
                rounding_residue = reconcile_amount - total_company;
                if let Some(last) = records.last_mut() {
                    last.company_paid_amount = self.scale.scaled(
                        last.company_paid_amount + rounding_residue,
                        &term.company_currency,
                    );
                    if let Some(p) = payment.as_deref_mut() {
                        if let Some(attached) = p.invoice_term_payments.last_mut() {
                            attached.company_paid_amount = last.company_paid_amount;
                        }
                    }
                }
                if !rounding_residue.is_zero() {
                    warn!(term_id = term.id, residue = %rounding_residue, "rounding residue booked");
                }
            }
        }

        info!(
            live,
            terms = terms.len(),
            records = records.len(),
            unallocated = %available.max(Decimal::ZERO),
            "payment allocated"
        );

        Ok(AllocationOutcome {
            records,
            unallocated_amount: available.max(Decimal::ZERO),
            rounding_residue,
        })
    }

    /// Build the record paying `paid_amount` on `term`.
    ///
    /// With a payment, the payment's discount flag may be switched on first
    /// if this term qualifies for it.
    pub fn create_invoice_term_payment(
        &self,
        payment: Option<&mut InvoicePayment>,
        term: &InvoiceTerm,
        paid_amount: Money,
    ) -> AccountResult<InvoiceTermPayment> {
        match payment {
            None => self.init_invoice_term_payment(term, paid_amount, term.apply_financial_discount),
            Some(payment) => {
                toggle_financial_discount(payment, term);
                self.init_invoice_term_payment(term, paid_amount, payment.apply_financial_discount)
            }
        }
    }

    fn init_invoice_term_payment(
        &self,
        term: &InvoiceTerm,
        paid_amount: Money,
        apply_financial_discount: bool,
    ) -> AccountResult<InvoiceTermPayment> {
        let mut record = InvoiceTermPayment::new(term.id, paid_amount);

        if paid_amount == term.amount {
            self.manage_invoice_term_financial_discount(&mut record, term, apply_financial_discount)?;
        }

        record.company_paid_amount = if term.is_company_currency() {
            paid_amount
        } else {
            self.compute_company_paid_amount(term, paid_amount)?
        };
        Ok(record)
    }

    /// Split the record's settled amount between payment and discount in the
    /// proportion it covers of the term. `paid + discount` is unchanged.
    pub fn manage_invoice_term_financial_discount(
        &self,
        record: &mut InvoiceTermPayment,
        term: &InvoiceTerm,
        apply_financial_discount: bool,
    ) -> AccountResult<()> {
        if !apply_financial_discount || term.amount_remaining_after_fin_discount <= Decimal::ZERO {
            return Ok(());
        }

        record.paid_amount = self.scale.scaled(record.settled_amount(), &term.currency);
        let ratio_paid = self
            .scale
            .ratio(record.paid_amount, term.amount, "paid amount / term amount")?;
        record.financial_discount_amount = self
            .scale
            .scaled(term.financial_discount_amount * ratio_paid, &term.currency);
        record.paid_amount = self.scale.scaled(
            record.paid_amount - record.financial_discount_amount,
            &term.currency,
        );
        Ok(())
    }

    /// Invoice-currency amount converted with the term's own rate.
    pub fn compute_company_paid_amount(
        &self,
        term: &InvoiceTerm,
        paid_amount: Money,
    ) -> AccountResult<Money> {
        let ratio = self
            .scale
            .ratio(term.company_amount, term.amount, "company amount / term amount")?;
        Ok(self.scale.scaled(paid_amount * ratio, &term.company_currency))
    }

    /// Inverse of [`compute_company_paid_amount`](Self::compute_company_paid_amount).
    pub fn compute_paid_amount(
        &self,
        term: &InvoiceTerm,
        company_paid_amount: Money,
    ) -> AccountResult<Money> {
        let ratio = self
            .scale
            .ratio(term.amount, term.company_amount, "term amount / company amount")?;
        Ok(self.scale.scaled(company_paid_amount * ratio, &term.currency))
    }

    /// Total settled by the payment's records, in payment currency.
    pub fn compute_invoice_payment_amount(&self, payment: &InvoicePayment) -> AccountResult<Money> {
        let settled = payment.allocated_amount();
        let converted = self.converter.convert(
            &payment.invoice_currency,
            &payment.currency,
            settled,
            self.today,
        )?;
        Ok(self.scale.scaled(converted, &payment.currency))
    }

    pub fn update_invoice_payment_amount(&self, payment: &mut InvoicePayment) -> AccountResult<()> {
        payment.amount = self.compute_invoice_payment_amount(payment)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_terms(terms: &[InvoiceTerm]) -> AccountResult<()> {
    for term in terms {
        if term.amount.is_zero() {
            return Err(AccountError::invalid(
                "invoice_term.amount",
                format!("Invoice term {} has a zero amount", term.id),
            ));
        }
        if term.company_amount.is_zero() {
            return Err(AccountError::invalid(
                "invoice_term.company_amount",
                format!("Invoice term {} has a zero company amount", term.id),
            ));
        }
    }
    Ok(())
}

fn next_term_index(live: bool, pending: &[&InvoiceTerm], available: Money) -> usize {
    if live {
        return 0;
    }
    pending
        .iter()
        .position(|t| t.amount == available || t.amount_remaining == available)
        .unwrap_or(0)
}

fn toggle_financial_discount(payment: &mut InvoicePayment, term: &InvoiceTerm) {
    let eligible = !payment.apply_financial_discount
        && !payment.manual_change
        && payment.payment_voucher.is_none()
        && (!term.is_selected_on_payment_session
            || term.apply_financial_discount_on_payment_session)
        && !term.is_partially_paid();
    if !eligible {
        return;
    }

    let linked_to_payment = payment
        .reconcile
        .as_ref()
        .map_or(true, Reconcile::is_linked_to_payment);
    let before_deadline = term
        .financial_discount_deadline_date
        .is_some_and(|deadline| payment.payment_date <= deadline);

    payment.apply_financial_discount =
        before_deadline && term.apply_financial_discount && linked_to_payment;
}
