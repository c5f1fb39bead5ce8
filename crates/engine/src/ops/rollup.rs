//! Project ledger rollup.
//!
//! The two project accumulators are only ever moved by additive deltas
//! inside the transaction that justified them (a paid transition, an
//! approved expense, a logged timesheet) or by the full rebuild below.

use sea_orm::{DatabaseTransaction, Statement, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{EngineError, MoneyCents, ResultEngine};

use super::{Engine, with_tx};

/// Outcome of a ledger rebuild: what was stored before, what the document
/// tables say, and the overwrite already applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerRebuildReport {
    pub project_id: String,
    pub stored_revenue: MoneyCents,
    pub computed_revenue: MoneyCents,
    pub stored_cost: MoneyCents,
    pub computed_cost: MoneyCents,
}

impl LedgerRebuildReport {
    pub fn revenue_drift(&self) -> MoneyCents {
        self.stored_revenue - self.computed_revenue
    }

    pub fn cost_drift(&self) -> MoneyCents {
        self.stored_cost - self.computed_cost
    }

    pub fn has_drift(&self) -> bool {
        !self.revenue_drift().is_zero() || !self.cost_drift().is_zero()
    }
}

async fn sum_minor(
    db_tx: &DatabaseTransaction,
    sql: &str,
    project_id: &str,
) -> ResultEngine<i64> {
    let stmt = Statement::from_sql_and_values(
        db_tx.get_database_backend(),
        sql,
        vec![project_id.into()],
    );
    let row = db_tx.query_one(stmt).await?;
    Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
}

impl Engine {
    pub(super) async fn apply_revenue(
        &self,
        db_tx: &DatabaseTransaction,
        project_id: &str,
        delta: MoneyCents,
    ) -> ResultEngine<()> {
        self.apply_project_delta(db_tx, project_id, "revenue_minor", delta)
            .await
    }

    pub(super) async fn apply_cost(
        &self,
        db_tx: &DatabaseTransaction,
        project_id: &str,
        delta: MoneyCents,
    ) -> ResultEngine<()> {
        self.apply_project_delta(db_tx, project_id, "cost_minor", delta)
            .await
    }

    async fn apply_project_delta(
        &self,
        db_tx: &DatabaseTransaction,
        project_id: &str,
        column: &str,
        delta: MoneyCents,
    ) -> ResultEngine<()> {
        if delta.is_zero() {
            return Ok(());
        }
        // column is one of two compile-time literals, never caller input.
        let sql = format!("UPDATE projects SET {column} = {column} + ? WHERE id = ?;");
        let updated = db_tx
            .execute(Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                sql,
                vec![delta.cents().into(), project_id.into()],
            ))
            .await?;
        if updated.rows_affected() != 1 {
            return Err(EngineError::NotFound("project not exists".to_string()));
        }
        Ok(())
    }

    /// Recomputes both accumulators from the authoritative documents (paid
    /// invoices, paid vendor bills, approved expenses, timesheet costs),
    /// overwrites the stored values and reports the drift. Admin/finance
    /// only.
    pub async fn rebuild_project_ledger(
        &self,
        username: &str,
        project_id: &str,
    ) -> ResultEngine<LedgerRebuildReport> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_finance_writer(&user)?;
            let project = self.find_project(&db_tx, project_id).await?;

            let revenue = sum_minor(
                &db_tx,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM customer_invoices \
                 WHERE project_id = ? AND status = 'paid'",
                project_id,
            )
            .await?;

            let bills = sum_minor(
                &db_tx,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM vendor_bills \
                 WHERE project_id = ? AND status = 'paid'",
                project_id,
            )
            .await?;
            let expenses = sum_minor(
                &db_tx,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM expenses \
                 WHERE project_id = ? AND status = 'approved'",
                project_id,
            )
            .await?;
            let timesheets = sum_minor(
                &db_tx,
                "SELECT COALESCE(SUM(cost_minor), 0) AS sum \
                 FROM timesheets \
                 WHERE project_id = ?",
                project_id,
            )
            .await?;
            let cost = bills + expenses + timesheets;

            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                "UPDATE projects SET revenue_minor = ?, cost_minor = ? WHERE id = ?;",
                vec![revenue.into(), cost.into(), project_id.into()],
            );
            db_tx.execute(stmt).await?;

            Ok(LedgerRebuildReport {
                project_id: project_id.to_string(),
                stored_revenue: MoneyCents::new(project.revenue_minor),
                computed_revenue: MoneyCents::new(revenue),
                stored_cost: MoneyCents::new(project.cost_minor),
                computed_cost: MoneyCents::new(cost),
            })
        })
    }
}
