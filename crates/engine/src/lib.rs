//! Financial document and project-ledger engine.
//!
//! Billing documents (sales orders, purchase orders, customer invoices,
//! vendor bills) flow through forward-only status lattices; the paid and
//! approved edges roll their amounts into per-project revenue/cost
//! accumulators inside the same DB transaction. All monetary values are
//! integer cents ([`MoneyCents`]).

pub use documents::DocumentKind;
pub use error::EngineError;
pub use expenses::{Expense, ExpenseStatus};
pub use invoices::{Invoice, InvoiceStatus};
pub use line_items::{LineItem, LineItemInput, document_amount, line_total};
pub use money::MoneyCents;
pub use ops::{
    ApproveOutcome, AttachReport, ConvertedInvoice, DashboardReport, DocumentGroupBy,
    DocumentListFilter, DocumentListing, Engine, EngineBuilder, ExpenseListFilter, GroupBucket,
    LedgerRebuildReport, NewExpense, NewInvoice, NewPurchaseOrder, NewSalesOrder, NewTimesheet,
    NewVendorBill, ProjectBucket, Scope, TimesheetListFilter, VendorSpend,
};
pub use projects::Project;
pub use purchase_orders::{PurchaseOrder, PurchaseOrderStatus};
pub use sales_orders::{SalesOrder, SalesOrderStatus};
pub use timesheets::Timesheet;
pub use users::Role;
pub use vendor_bills::{VendorBill, VendorBillStatus};

mod documents;
mod error;
pub mod expenses;
pub mod invoices;
pub mod line_items;
mod money;
mod ops;
pub mod project_members;
pub mod projects;
pub mod purchase_orders;
pub mod sales_orders;
pub mod sequences;
pub mod timesheets;
pub mod users;
pub mod vendor_bills;

type ResultEngine<T> = Result<T, EngineError>;
