//! Financial discount totals of a payment.

use rust_decimal::Decimal;

use crate::currency::CurrencyScale;
use crate::payment::model::InvoicePayment;
use crate::types::Currency;
use crate::AccountResult;

/// Recomputes the financial discount totals carried by a payment.
pub trait FinancialDiscountCalculator {
    fn compute_financial_discount(&self, payment: &mut InvoicePayment) -> AccountResult<()>;
}

/// Sums the discount granted on each allocation record.
#[derive(Debug, Clone)]
pub struct StandardFinancialDiscount {
    scale: CurrencyScale,
    company_currency: Currency,
}

impl StandardFinancialDiscount {
    pub fn new(scale: CurrencyScale, company_currency: Currency) -> Self {
        StandardFinancialDiscount {
            scale,
            company_currency,
        }
    }
}

impl FinancialDiscountCalculator for StandardFinancialDiscount {
    fn compute_financial_discount(&self, payment: &mut InvoicePayment) -> AccountResult<()> {
        let total = if payment.apply_financial_discount {
            payment
                .invoice_term_payments
                .iter()
                .map(|itp| itp.financial_discount_amount)
                .sum()
        } else {
            Decimal::ZERO
        };

        payment.financial_discount_total_amount = self.scale.scaled(total, &self.company_currency);
        payment.total_amount_with_financial_discount = self
            .scale
            .scaled(payment.amount + payment.financial_discount_total_amount, &self.company_currency);
        Ok(())
    }
}
