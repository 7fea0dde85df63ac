//! Invoice payment allocation across invoice terms.

pub mod allocation;
pub mod discount;
pub mod model;
pub mod request;

pub use allocation::{AllocationMode, PaymentAllocator};
pub use discount::{FinancialDiscountCalculator, StandardFinancialDiscount};
pub use model::{
    FunctionalOrigin, Invoice, InvoicePayment, InvoiceTerm, InvoiceTermPayment,
    PayVoucherElementToPay, PaymentVoucher, Reconcile,
};
