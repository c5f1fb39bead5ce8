//! Employee-submitted expenses.
//!
//! Approval rolls the amount into project cost; billable approved
//! expenses are then attached to the project's open draft invoice.
//! `reimbursed` is an independent flag on approved expenses, not a
//! status value.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// pending → approved | rejected; both outcomes are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(self, target: ExpenseStatus) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
        )
    }
}

impl TryFrom<&str> for ExpenseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::Validation(format!(
                "invalid expense status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub project_id: String,
    pub description: String,
    pub amount: MoneyCents,
    pub billable: bool,
    pub submitted_by: String,
    pub receipt_url: Option<String>,
    pub status: ExpenseStatus,
    pub reimbursed: bool,
    pub reimbursed_at: Option<DateTime<Utc>>,
    pub billed: bool,
    pub billed_at: Option<DateTime<Utc>>,
    pub invoice_id: Option<Uuid>,
    pub submitted_on: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        project_id: String,
        description: String,
        amount: MoneyCents,
        billable: bool,
        submitted_by: String,
        receipt_url: Option<String>,
        submitted_on: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "amount must be >= 0".to_string(),
            ));
        }
        if description.trim().is_empty() {
            return Err(EngineError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            description,
            amount,
            billable,
            submitted_by,
            receipt_url,
            status: ExpenseStatus::Pending,
            reimbursed: false,
            reimbursed_at: None,
            billed: false,
            billed_at: None,
            invoice_id: None,
            submitted_on,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub billable: bool,
    pub submitted_by: String,
    pub receipt_url: Option<String>,
    pub status: String,
    pub reimbursed: bool,
    pub reimbursed_at: Option<DateTimeUtc>,
    pub billed: bool,
    pub billed_at: Option<DateTimeUtc>,
    pub invoice_id: Option<String>,
    pub submitted_on: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id"
    )]
    Invoice,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(exp: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(exp.id.to_string()),
            project_id: ActiveValue::Set(exp.project_id.clone()),
            description: ActiveValue::Set(exp.description.clone()),
            amount_minor: ActiveValue::Set(exp.amount.cents()),
            billable: ActiveValue::Set(exp.billable),
            submitted_by: ActiveValue::Set(exp.submitted_by.clone()),
            receipt_url: ActiveValue::Set(exp.receipt_url.clone()),
            status: ActiveValue::Set(exp.status.as_str().to_string()),
            reimbursed: ActiveValue::Set(exp.reimbursed),
            reimbursed_at: ActiveValue::Set(exp.reimbursed_at),
            billed: ActiveValue::Set(exp.billed),
            billed_at: ActiveValue::Set(exp.billed_at),
            invoice_id: ActiveValue::Set(exp.invoice_id.map(|id| id.to_string())),
            submitted_on: ActiveValue::Set(exp.submitted_on),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("expense not exists".to_string()))?,
            project_id: model.project_id,
            description: model.description,
            amount: MoneyCents::new(model.amount_minor),
            billable: model.billable,
            submitted_by: model.submitted_by,
            receipt_url: model.receipt_url,
            status: ExpenseStatus::try_from(model.status.as_str())?,
            reimbursed: model.reimbursed,
            reimbursed_at: model.reimbursed_at,
            billed: model.billed,
            billed_at: model.billed_at,
            invoice_id: model.invoice_id.and_then(|s| Uuid::parse_str(&s).ok()),
            submitted_on: model.submitted_on,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_and_rejection_are_terminal() {
        use ExpenseStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Pending));
    }
}
