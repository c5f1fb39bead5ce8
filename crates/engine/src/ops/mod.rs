use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod access;
mod dashboard;
mod expenses;
mod invoices;
mod linking;
mod listing;
mod projects;
mod purchase_orders;
mod rollup;
mod sales_orders;
mod sequence;
mod timesheets;
mod vendor_bills;

pub use access::Scope;
pub use dashboard::{DashboardReport, ProjectBucket, VendorSpend};
pub use expenses::{ApproveOutcome, AttachReport, ExpenseListFilter, NewExpense};
pub use invoices::NewInvoice;
pub use linking::ConvertedInvoice;
pub use listing::{DocumentGroupBy, DocumentListFilter, DocumentListing, GroupBucket};
pub use purchase_orders::NewPurchaseOrder;
pub use rollup::LedgerRebuildReport;
pub use sales_orders::NewSalesOrder;
pub use timesheets::{NewTimesheet, TimesheetListFilter};
pub use vendor_bills::NewVendorBill;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
