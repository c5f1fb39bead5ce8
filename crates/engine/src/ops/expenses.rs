//! Expense store: submit, list, approve/reject, reimburse.
//!
//! Approval commits the status change and the cost rollup first; the
//! invoice attachment then runs in its own transaction so a billing
//! failure never reverts an approved expense. The attachment outcome is
//! surfaced to the caller instead of being swallowed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Expense, ExpenseStatus, MoneyCents, ResultEngine, Role, expenses,
};

use super::{Engine, Scope, normalize_optional_text, normalize_required_text, with_tx};

/// Payload for submitting an expense.
#[derive(Clone, Debug, Default)]
pub struct NewExpense {
    pub project_id: String,
    pub description: String,
    pub amount: MoneyCents,
    pub billable: bool,
    pub receipt_url: Option<String>,
    pub submitted_on: Option<DateTime<Utc>>,
}

/// Filters for listing expenses.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub project_id: Option<String>,
    pub status: Option<ExpenseStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// What happened to the invoice attachment after an approval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachReport {
    Attached {
        invoice_id: Uuid,
        invoice_created: bool,
    },
    NotBillable,
    Failed {
        reason: String,
    },
}

/// Approval result: the expense after the status change plus the
/// attachment report.
#[derive(Clone, Debug, PartialEq)]
pub struct ApproveOutcome {
    pub expense: Expense,
    pub attachment: AttachReport,
}

impl Engine {
    /// Submit an expense against a project the caller belongs to.
    pub async fn submit_expense(&self, username: &str, cmd: NewExpense) -> ResultEngine<Uuid> {
        let description = normalize_required_text(&cmd.description, "description")?;
        let submitted_on = cmd.submitted_on.unwrap_or_else(Utc::now);
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_project_member(&db_tx, &cmd.project_id, &user)
                .await?;

            let expense = Expense::new(
                cmd.project_id.clone(),
                description,
                cmd.amount,
                cmd.billable,
                username.to_string(),
                normalize_optional_text(cmd.receipt_url.as_deref()),
                submitted_on,
            )?;
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            Ok(expense.id)
        })
    }

    /// List expenses under the caller's scope: admin/finance see all, a
    /// project manager sees their projects, everyone else sees only their
    /// own submissions.
    pub async fn list_expenses(
        &self,
        username: &str,
        filter: ExpenseListFilter,
    ) -> ResultEngine<Vec<Expense>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from > to
        {
            return Err(EngineError::Validation(
                "invalid range: from must be <= to".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;

            let mut select = expenses::Entity::find();
            match &scope {
                Scope::All => {}
                Scope::Projects(ids) => {
                    select = select.filter(expenses::Column::ProjectId.is_in(ids.clone()));
                }
                Scope::OwnOnly => {
                    select = select.filter(expenses::Column::SubmittedBy.eq(username));
                }
            }
            if let Some(project_id) = &filter.project_id {
                select = select.filter(expenses::Column::ProjectId.eq(project_id.clone()));
            }
            if let Some(status) = filter.status {
                select = select.filter(expenses::Column::Status.eq(status.as_str()));
            }
            if let Some(from) = filter.from {
                select = select.filter(expenses::Column::SubmittedOn.gte(from));
            }
            if let Some(to) = filter.to {
                select = select.filter(expenses::Column::SubmittedOn.lte(to));
            }

            let models = select
                .order_by_desc(expenses::Column::SubmittedOn)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Expense::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Approve an expense, roll its amount into project cost, then try to
    /// bill it.
    ///
    /// Approving an already approved expense is a status no-op but
    /// re-attempts the attachment while the expense is billable and not
    /// yet billed; that is the retry path for a failed attachment.
    pub async fn approve_expense(&self, username: &str, id: Uuid) -> ResultEngine<ApproveOutcome> {
        let expense = with_tx!(self, |db_tx| {
            let mut expense = self.require_approvable(&db_tx, username, id).await?;
            if expense.status != ExpenseStatus::Approved {
                if !expense.status.can_transition_to(ExpenseStatus::Approved) {
                    return Err(EngineError::InvalidTransition(format!(
                        "expense {} -> approved",
                        expense.status.as_str()
                    )));
                }
                let active = expenses::ActiveModel {
                    id: ActiveValue::Set(expense.id.to_string()),
                    status: ActiveValue::Set(ExpenseStatus::Approved.as_str().to_string()),
                    ..Default::default()
                };
                active.update(&db_tx).await?;
                self.apply_cost(&db_tx, &expense.project_id, expense.amount)
                    .await?;
                expense.status = ExpenseStatus::Approved;
            }
            Ok::<_, EngineError>(expense)
        })?;

        if !expense.billable {
            return Ok(ApproveOutcome {
                expense,
                attachment: AttachReport::NotBillable,
            });
        }
        if expense.billed {
            let attachment = match expense.invoice_id {
                Some(invoice_id) => AttachReport::Attached {
                    invoice_id,
                    invoice_created: false,
                },
                None => AttachReport::Failed {
                    reason: "billed expense without invoice reference".to_string(),
                },
            };
            return Ok(ApproveOutcome { expense, attachment });
        }

        let attachment = match self.attach_expense_to_invoice(&expense).await {
            Ok((invoice_id, invoice_created)) => AttachReport::Attached {
                invoice_id,
                invoice_created,
            },
            Err(err) => {
                tracing::warn!(
                    expense_id = %expense.id,
                    project_id = %expense.project_id,
                    error = %err,
                    "expense approved but invoice attachment failed"
                );
                AttachReport::Failed {
                    reason: err.to_string(),
                }
            }
        };
        Ok(ApproveOutcome { expense, attachment })
    }

    /// Reject a pending expense. Never touches the project ledger.
    pub async fn reject_expense(&self, username: &str, id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let mut expense = self.require_approvable(&db_tx, username, id).await?;
            if expense.status == ExpenseStatus::Rejected {
                return Ok(expense);
            }
            if !expense.status.can_transition_to(ExpenseStatus::Rejected) {
                return Err(EngineError::InvalidTransition(format!(
                    "expense {} -> rejected",
                    expense.status.as_str()
                )));
            }
            let active = expenses::ActiveModel {
                id: ActiveValue::Set(expense.id.to_string()),
                status: ActiveValue::Set(ExpenseStatus::Rejected.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            expense.status = ExpenseStatus::Rejected;
            Ok(expense)
        })
    }

    /// Mark an approved expense reimbursed.
    pub async fn reimburse_expense(&self, username: &str, id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let mut expense = self.require_approvable(&db_tx, username, id).await?;
            if expense.status != ExpenseStatus::Approved {
                return Err(EngineError::InvalidTransition(format!(
                    "cannot reimburse a {} expense",
                    expense.status.as_str()
                )));
            }
            if expense.reimbursed {
                return Ok(expense);
            }
            let now = Utc::now();
            let active = expenses::ActiveModel {
                id: ActiveValue::Set(expense.id.to_string()),
                reimbursed: ActiveValue::Set(true),
                reimbursed_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            expense.reimbursed = true;
            expense.reimbursed_at = Some(now);
            Ok(expense)
        })
    }

    /// Load an expense and check the caller may decide on it: admin,
    /// finance, or the manager of its project.
    async fn require_approvable(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        username: &str,
        id: Uuid,
    ) -> ResultEngine<Expense> {
        let user = self.require_user(db_tx, username).await?;
        let model = expenses::Entity::find_by_id(id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("expense not exists".to_string()))?;
        let role = self.user_role(&user)?;
        if !role.is_unrestricted() {
            let project = self.find_project(db_tx, &model.project_id).await?;
            if role != Role::ProjectManager || project.manager_id != user.username {
                return Err(EngineError::Forbidden(
                    "not allowed to decide on this expense".to_string(),
                ));
            }
        }
        Expense::try_from(model)
    }
}
