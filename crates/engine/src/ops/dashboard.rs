//! Finance dashboard aggregates.
//!
//! Computed from the document tables with SQL sums, deliberately not
//! from the denormalized project accumulators, so the dashboard stays
//! truthful even when an accumulator has drifted.

use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, Statement, TransactionTrait, prelude::*};

use crate::{MoneyCents, ResultEngine, projects};

use super::{Engine, with_tx};

/// Revenue vs cost for one project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectBucket {
    pub project_id: String,
    pub name: String,
    pub revenue: MoneyCents,
    pub cost: MoneyCents,
}

/// Total billed amount per vendor, descending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VendorSpend {
    pub vendor: String,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardReport {
    /// Σ paid customer invoices.
    pub revenue: MoneyCents,
    /// Σ paid vendor bills + Σ approved expenses.
    pub cost: MoneyCents,
    pub gross_profit: MoneyCents,
    /// Σ non-paid invoices + Σ non-paid bills.
    pub outstanding: MoneyCents,
    pub projects: Vec<ProjectBucket>,
    pub vendor_spend: Vec<VendorSpend>,
}

async fn scalar_sum(db_tx: &DatabaseTransaction, sql: &str) -> ResultEngine<i64> {
    let stmt = Statement::from_string(db_tx.get_database_backend(), sql);
    let row = db_tx.query_one(stmt).await?;
    Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
}

async fn grouped_sum(
    db_tx: &DatabaseTransaction,
    sql: &str,
) -> ResultEngine<Vec<(String, i64)>> {
    let stmt = Statement::from_string(db_tx.get_database_backend(), sql);
    let rows = db_tx.query_all(stmt).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let key: String = row.try_get("", "key")?;
        let sum: i64 = row.try_get("", "sum")?;
        out.push((key, sum));
    }
    Ok(out)
}

impl Engine {
    /// Company-wide financial overview. Admin/finance only.
    pub async fn finance_dashboard(&self, username: &str) -> ResultEngine<DashboardReport> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_finance_writer(&user)?;

            let revenue = scalar_sum(
                &db_tx,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM customer_invoices WHERE status = 'paid'",
            )
            .await?;
            let bills_paid = scalar_sum(
                &db_tx,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM vendor_bills WHERE status = 'paid'",
            )
            .await?;
            let expenses_approved = scalar_sum(
                &db_tx,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM expenses WHERE status = 'approved'",
            )
            .await?;
            let outstanding = scalar_sum(
                &db_tx,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum FROM ( \
                   SELECT amount_minor FROM customer_invoices WHERE status <> 'paid' \
                   UNION ALL \
                   SELECT amount_minor FROM vendor_bills WHERE status <> 'paid' \
                 )",
            )
            .await?;

            let revenue_by_project: HashMap<String, i64> = grouped_sum(
                &db_tx,
                "SELECT project_id AS key, COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM customer_invoices WHERE status = 'paid' GROUP BY project_id",
            )
            .await?
            .into_iter()
            .collect();
            let mut cost_by_project: HashMap<String, i64> = grouped_sum(
                &db_tx,
                "SELECT project_id AS key, COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM vendor_bills WHERE status = 'paid' GROUP BY project_id",
            )
            .await?
            .into_iter()
            .collect();
            for (key, sum) in grouped_sum(
                &db_tx,
                "SELECT project_id AS key, COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM expenses WHERE status = 'approved' GROUP BY project_id",
            )
            .await?
            {
                *cost_by_project.entry(key).or_insert(0) += sum;
            }

            let project_models = projects::Entity::find().all(&db_tx).await?;
            let buckets = project_models
                .into_iter()
                .map(|p| ProjectBucket {
                    revenue: MoneyCents::new(
                        revenue_by_project.get(&p.id).copied().unwrap_or(0),
                    ),
                    cost: MoneyCents::new(cost_by_project.get(&p.id).copied().unwrap_or(0)),
                    project_id: p.id,
                    name: p.name,
                })
                .collect();

            let vendor_spend = grouped_sum(
                &db_tx,
                "SELECT vendor AS key, COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM vendor_bills GROUP BY vendor ORDER BY sum DESC",
            )
            .await?
            .into_iter()
            .map(|(vendor, total)| VendorSpend {
                vendor,
                total: MoneyCents::new(total),
            })
            .collect();

            let cost = bills_paid + expenses_approved;
            Ok(DashboardReport {
                revenue: MoneyCents::new(revenue),
                cost: MoneyCents::new(cost),
                gross_profit: MoneyCents::new(revenue - cost),
                outstanding: MoneyCents::new(outstanding),
                projects: buckets,
                vendor_spend,
            })
        })
    }
}
