//! Shared listing filter for billing documents.
//!
//! One filter type serves all four document tables; per-table query
//! builders are generated by `impl_document_listing!` so the scope and
//! filter semantics cannot drift between document kinds.

use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, MoneyCents, ResultEngine, invoices, purchase_orders, sales_orders, vendor_bills,
};

use super::{Engine, Scope};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentGroupBy {
    Project,
    Status,
    Party,
}

impl TryFrom<&str> for DocumentGroupBy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "project" => Ok(Self::Project),
            "status" => Ok(Self::Status),
            "party" => Ok(Self::Party),
            other => Err(EngineError::Validation(format!(
                "invalid group_by: {other}"
            ))),
        }
    }
}

/// Filters for listing billing documents.
///
/// `from`/`to` bound `issued_on` inclusively on both ends, in UTC.
/// `search` is a case-insensitive substring over the document number and
/// the party (customer/vendor) name.
#[derive(Clone, Debug, Default)]
pub struct DocumentListFilter {
    pub statuses: Option<Vec<String>>,
    pub project_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub group_by: Option<DocumentGroupBy>,
}

/// One aggregation bucket for a grouped listing, ordered by total
/// descending in the response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupBucket {
    pub key: String,
    pub count: u64,
    pub total: MoneyCents,
}

/// Listing result: plain rows (newest first) or aggregation buckets when
/// `group_by` was requested.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentListing<T> {
    Rows(Vec<T>),
    Groups(Vec<GroupBucket>),
}

pub(super) fn validate_list_filter(filter: &DocumentListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::Validation(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    if filter.statuses.as_ref().is_some_and(|s| s.is_empty()) {
        return Err(EngineError::Validation(
            "statuses must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn sort_buckets(mut buckets: Vec<GroupBucket>) -> Vec<GroupBucket> {
    buckets.sort_by(|a, b| b.total.cents().cmp(&a.total.cents()));
    buckets
}

/// Generates a scope-aware list/group query for one document table.
macro_rules! impl_document_listing {
    ($fn_name:ident, $module:ident, $domain:ty, $status_ty:ty, $party_col:expr, $party_sql:literal) => {
        pub(super) async fn $fn_name(
            &self,
            db: &DatabaseTransaction,
            scope: &Scope,
            filter: &DocumentListFilter,
        ) -> ResultEngine<DocumentListing<$domain>> {
            validate_list_filter(filter)?;

            let mut select = $module::Entity::find();
            match scope {
                Scope::All => {}
                Scope::Projects(ids) => {
                    select = select.filter($module::Column::ProjectId.is_in(ids.clone()));
                }
                Scope::OwnOnly => {
                    return Err(EngineError::Forbidden(
                        "no billing document visibility".to_string(),
                    ));
                }
            }

            if let Some(statuses) = &filter.statuses {
                for status in statuses {
                    <$status_ty>::try_from(status.as_str())?;
                }
                select = select.filter($module::Column::Status.is_in(statuses.clone()));
            }
            if let Some(project_id) = &filter.project_id {
                if !scope.can_see_project(project_id) {
                    return Err(EngineError::Forbidden("project out of scope".to_string()));
                }
                select = select.filter($module::Column::ProjectId.eq(project_id.clone()));
            }
            if let Some(from) = filter.from {
                select = select.filter($module::Column::IssuedOn.gte(from));
            }
            if let Some(to) = filter.to {
                select = select.filter($module::Column::IssuedOn.lte(to));
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{}%", search.trim().to_lowercase());
                select = select.filter(
                    Condition::any()
                        .add(Expr::cust_with_values(
                            "LOWER(number) LIKE ?",
                            [pattern.clone()],
                        ))
                        .add(Expr::cust_with_values(
                            concat!("LOWER(", $party_sql, ") LIKE ?"),
                            [pattern],
                        )),
                );
            }

            if let Some(group_by) = filter.group_by {
                let key_col = match group_by {
                    DocumentGroupBy::Project => $module::Column::ProjectId,
                    DocumentGroupBy::Status => $module::Column::Status,
                    DocumentGroupBy::Party => $party_col,
                };
                let rows: Vec<(String, i64, Option<i64>)> = select
                    .select_only()
                    .column_as(key_col, "key")
                    .column_as($module::Column::Id.count(), "count")
                    .column_as($module::Column::AmountMinor.sum(), "total")
                    .group_by(key_col)
                    .into_tuple()
                    .all(db)
                    .await?;
                let buckets = rows
                    .into_iter()
                    .map(|(key, count, total)| GroupBucket {
                        key,
                        count: count as u64,
                        total: MoneyCents::new(total.unwrap_or_default()),
                    })
                    .collect();
                return Ok(DocumentListing::Groups(sort_buckets(buckets)));
            }

            let models = select
                .order_by_desc($module::Column::IssuedOn)
                .all(db)
                .await?;
            let rows = models
                .into_iter()
                .map(<$domain>::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(DocumentListing::Rows(rows))
        }
    };
}

impl Engine {
    impl_document_listing!(
        query_sales_orders,
        sales_orders,
        crate::SalesOrder,
        crate::SalesOrderStatus,
        sales_orders::Column::Customer,
        "customer"
    );

    impl_document_listing!(
        query_purchase_orders,
        purchase_orders,
        crate::PurchaseOrder,
        crate::PurchaseOrderStatus,
        purchase_orders::Column::Vendor,
        "vendor"
    );

    impl_document_listing!(
        query_invoices,
        invoices,
        crate::Invoice,
        crate::InvoiceStatus,
        invoices::Column::Customer,
        "customer"
    );

    impl_document_listing!(
        query_vendor_bills,
        vendor_bills,
        crate::VendorBill,
        crate::VendorBillStatus,
        vendor_bills::Column::Vendor,
        "vendor"
    );
}
