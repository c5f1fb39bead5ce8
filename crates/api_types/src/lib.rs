use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A priced row inside a billing document.
///
/// `unit_price_minor` is in minor currency units (cents); `tax_rate` is a
/// fraction, e.g. `0.18` for 18%.
#[derive(Debug, Serialize, Deserialize)]
pub struct LineItemNew {
    pub description: Option<String>,
    pub product: Option<String>,
    pub quantity: f64,
    pub unit_price_minor: i64,
    pub tax_rate: f64,
}

/// A stored line item, including its computed total.
#[derive(Debug, Serialize, Deserialize)]
pub struct LineItemView {
    pub id: Uuid,
    pub position: u32,
    pub description: Option<String>,
    pub product: Option<String>,
    pub quantity: f64,
    pub unit_price_minor: i64,
    pub tax_rate: f64,
    pub total_minor: i64,
    pub sales_order_id: Option<Uuid>,
    pub expense_id: Option<Uuid>,
}

/// Query parameters shared by the four document list endpoints.
///
/// `status` takes a comma-separated list; `from`/`to` bound the issue
/// date inclusively; `q` searches the document number and the party
/// name; `group_by` is one of `project`, `status`, `party`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocumentListQuery {
    pub status: Option<String>,
    pub project_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub q: Option<String>,
    pub group_by: Option<String>,
}

/// One aggregation bucket of a grouped document listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupBucketView {
    pub key: String,
    pub count: u64,
    pub total_minor: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentCreated {
    pub id: Uuid,
}

pub mod sales_order {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SalesOrderNew {
        pub customer: String,
        pub project_id: String,
        /// Used verbatim when `items` is empty; otherwise the amount is
        /// computed from the items.
        pub amount_minor: Option<i64>,
        #[serde(default)]
        pub items: Vec<LineItemNew>,
        pub description: Option<String>,
        pub issued_on: Option<DateTime<Utc>>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SalesOrderView {
        pub id: Uuid,
        pub number: String,
        pub customer: String,
        pub project_id: String,
        pub amount_minor: i64,
        pub status: String,
        pub converted_invoice_id: Option<Uuid>,
        pub description: Option<String>,
        pub issued_on: DateTime<Utc>,
        pub created_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum SalesOrderListResponse {
        Rows { sales_orders: Vec<SalesOrderView> },
        Groups { groups: Vec<GroupBucketView> },
    }

    /// Response of converting a sales order into a draft invoice.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConvertedInvoiceView {
        pub invoice_id: Uuid,
        pub number: String,
        pub amount_minor: i64,
    }
}

pub mod purchase_order {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseOrderNew {
        pub vendor: String,
        pub project_id: String,
        pub amount_minor: Option<i64>,
        #[serde(default)]
        pub items: Vec<LineItemNew>,
        pub description: Option<String>,
        pub issued_on: Option<DateTime<Utc>>,
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseOrderView {
        pub id: Uuid,
        pub number: String,
        pub vendor: String,
        pub project_id: String,
        pub amount_minor: i64,
        pub status: String,
        pub description: Option<String>,
        pub issued_on: DateTime<Utc>,
        pub created_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum PurchaseOrderListResponse {
        Rows { purchase_orders: Vec<PurchaseOrderView> },
        Groups { groups: Vec<GroupBucketView> },
    }
}

pub mod invoice {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceNew {
        pub customer: String,
        pub project_id: String,
        pub amount_minor: Option<i64>,
        #[serde(default)]
        pub items: Vec<LineItemNew>,
        pub issued_on: Option<DateTime<Utc>>,
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceView {
        pub id: Uuid,
        pub number: String,
        pub customer: String,
        pub project_id: String,
        pub amount_minor: i64,
        pub status: String,
        /// The sales order this invoice was converted from, if any.
        pub sales_order_id: Option<Uuid>,
        pub issued_on: DateTime<Utc>,
        pub created_by: String,
        pub line_items: Vec<LineItemView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum InvoiceListResponse {
        Rows { invoices: Vec<InvoiceView> },
        Groups { groups: Vec<GroupBucketView> },
    }
}

pub mod vendor_bill {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorBillNew {
        pub vendor: String,
        pub project_id: String,
        pub amount_minor: Option<i64>,
        #[serde(default)]
        pub items: Vec<LineItemNew>,
        /// Optional link to the purchase order this bill settles.
        pub purchase_order_id: Option<Uuid>,
        pub attachment_url: Option<String>,
        pub issued_on: Option<DateTime<Utc>>,
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorBillView {
        pub id: Uuid,
        pub number: String,
        pub vendor: String,
        pub project_id: String,
        pub amount_minor: i64,
        pub status: String,
        pub purchase_order_id: Option<Uuid>,
        pub attachment_url: Option<String>,
        pub issued_on: DateTime<Utc>,
        pub created_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum VendorBillListResponse {
        Rows { vendor_bills: Vec<VendorBillView> },
        Groups { groups: Vec<GroupBucketView> },
    }
}

pub mod project {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectNew {
        pub name: String,
        pub client: Option<String>,
        pub manager_id: String,
        pub budget_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectCreated {
        pub id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectView {
        pub id: String,
        pub name: String,
        pub client: Option<String>,
        pub manager_id: String,
        pub budget_minor: i64,
        pub revenue_minor: i64,
        pub cost_minor: i64,
        pub profit_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectListResponse {
        pub projects: Vec<ProjectView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberAdd {
        pub username: String,
    }

    /// Result of recomputing a project's revenue/cost accumulators from
    /// the underlying documents.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerRebuildView {
        pub project_id: String,
        pub stored_revenue_minor: i64,
        pub computed_revenue_minor: i64,
        pub stored_cost_minor: i64,
        pub computed_cost_minor: i64,
        pub drift: bool,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub project_id: String,
        pub description: String,
        pub amount_minor: i64,
        #[serde(default)]
        pub billable: bool,
        pub receipt_url: Option<String>,
        pub submitted_on: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseListQuery {
        pub project_id: Option<String>,
        pub status: Option<String>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub project_id: String,
        pub description: String,
        pub amount_minor: i64,
        pub billable: bool,
        pub submitted_by: String,
        pub receipt_url: Option<String>,
        pub status: String,
        pub reimbursed: bool,
        pub reimbursed_at: Option<DateTime<Utc>>,
        pub billed: bool,
        pub billed_at: Option<DateTime<Utc>>,
        pub invoice_id: Option<Uuid>,
        pub submitted_on: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
    }

    /// What happened to the invoice attachment of an approved billable
    /// expense.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "outcome", rename_all = "snake_case")]
    pub enum AttachmentView {
        Attached {
            invoice_id: Uuid,
            invoice_created: bool,
        },
        NotBillable,
        Failed {
            reason: String,
        },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApproveResponse {
        pub expense: ExpenseView,
        pub attachment: AttachmentView,
    }
}

pub mod timesheet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TimesheetNew {
        pub project_id: String,
        pub hours: f64,
        #[serde(default)]
        pub billable: bool,
        pub notes: Option<String>,
        pub worked_on: NaiveDate,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TimesheetListQuery {
        pub project_id: Option<String>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TimesheetView {
        pub id: Uuid,
        pub project_id: String,
        pub username: String,
        pub hours: f64,
        pub billable: bool,
        pub notes: Option<String>,
        /// Cost applied to the project ledger when the entry was logged.
        pub cost_minor: i64,
        pub worked_on: NaiveDate,
        pub logged_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TimesheetListResponse {
        pub timesheets: Vec<TimesheetView>,
    }
}

pub mod dashboard {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectBucketView {
        pub project_id: String,
        pub name: String,
        pub revenue_minor: i64,
        pub cost_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorSpendView {
        pub vendor: String,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardResponse {
        pub revenue_minor: i64,
        pub cost_minor: i64,
        pub gross_profit_minor: i64,
        pub outstanding_minor: i64,
        pub projects: Vec<ProjectBucketView>,
        pub vendor_spend: Vec<VendorSpendView>,
    }
}
