//! Sales orders: draft commitments to bill a customer, convertible into
//! a customer invoice.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Forward-only status lattice: draft → confirmed → paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesOrderStatus {
    Draft,
    Confirmed,
    Paid,
}

impl SalesOrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::Paid => "paid",
        }
    }

    pub fn can_transition_to(self, target: SalesOrderStatus) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Confirmed) | (Self::Confirmed, Self::Paid)
        )
    }
}

impl TryFrom<&str> for SalesOrderStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "confirmed" => Ok(Self::Confirmed),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::Validation(format!(
                "invalid sales order status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: Uuid,
    pub number: String,
    pub customer: String,
    pub project_id: String,
    pub amount: MoneyCents,
    pub status: SalesOrderStatus,
    /// Set on first conversion; blocks duplicate invoices from one order.
    pub converted_invoice_id: Option<Uuid>,
    pub description: Option<String>,
    pub issued_on: DateTime<Utc>,
    pub created_by: String,
    pub idempotency_key: Option<String>,
}

impl SalesOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: String,
        customer: String,
        project_id: String,
        amount: MoneyCents,
        description: Option<String>,
        issued_on: DateTime<Utc>,
        created_by: String,
        idempotency_key: Option<String>,
    ) -> ResultEngine<Self> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "amount must be >= 0".to_string(),
            ));
        }
        if customer.trim().is_empty() {
            return Err(EngineError::Validation(
                "customer must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            number,
            customer,
            project_id,
            amount,
            status: SalesOrderStatus::Draft,
            converted_invoice_id: None,
            description,
            issued_on,
            created_by,
            idempotency_key,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sales_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub number: String,
    pub customer: String,
    pub project_id: String,
    pub amount_minor: i64,
    pub status: String,
    pub converted_invoice_id: Option<String>,
    pub description: Option<String>,
    pub issued_on: DateTimeUtc,
    pub created_by: String,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SalesOrder> for ActiveModel {
    fn from(so: &SalesOrder) -> Self {
        Self {
            id: ActiveValue::Set(so.id.to_string()),
            number: ActiveValue::Set(so.number.clone()),
            customer: ActiveValue::Set(so.customer.clone()),
            project_id: ActiveValue::Set(so.project_id.clone()),
            amount_minor: ActiveValue::Set(so.amount.cents()),
            status: ActiveValue::Set(so.status.as_str().to_string()),
            converted_invoice_id: ActiveValue::Set(
                so.converted_invoice_id.map(|id| id.to_string()),
            ),
            description: ActiveValue::Set(so.description.clone()),
            issued_on: ActiveValue::Set(so.issued_on),
            created_by: ActiveValue::Set(so.created_by.clone()),
            idempotency_key: ActiveValue::Set(so.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for SalesOrder {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("sales order not exists".to_string()))?,
            number: model.number,
            customer: model.customer,
            project_id: model.project_id,
            amount: MoneyCents::new(model.amount_minor),
            status: SalesOrderStatus::try_from(model.status.as_str())?,
            converted_invoice_id: model
                .converted_invoice_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            description: model.description,
            issued_on: model.issued_on,
            created_by: model.created_by,
            idempotency_key: model.idempotency_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_is_forward_only() {
        use SalesOrderStatus::*;
        assert!(Draft.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Paid));
        assert!(!Draft.can_transition_to(Paid));
        assert!(!Confirmed.can_transition_to(Draft));
        assert!(!Paid.can_transition_to(Confirmed));
        assert!(!Paid.can_transition_to(Draft));
    }
}
