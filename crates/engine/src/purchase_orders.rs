//! Purchase orders: commitments to pay a vendor.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Forward-only status lattice: draft → approved → paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Approved,
    Paid,
}

impl PurchaseOrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Paid => "paid",
        }
    }

    pub fn can_transition_to(self, target: PurchaseOrderStatus) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Approved) | (Self::Approved, Self::Paid)
        )
    }
}

impl TryFrom<&str> for PurchaseOrderStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::Validation(format!(
                "invalid purchase order status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub number: String,
    pub vendor: String,
    pub project_id: String,
    pub amount: MoneyCents,
    pub status: PurchaseOrderStatus,
    pub description: Option<String>,
    pub issued_on: DateTime<Utc>,
    pub created_by: String,
    pub idempotency_key: Option<String>,
}

impl PurchaseOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: String,
        vendor: String,
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
        if vendor.trim().is_empty() {
            return Err(EngineError::Validation(
                "vendor must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            number,
            vendor,
            project_id,
            amount,
            status: PurchaseOrderStatus::Draft,
            description,
            issued_on,
            created_by,
            idempotency_key,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub number: String,
    pub vendor: String,
    pub project_id: String,
    pub amount_minor: i64,
    pub status: String,
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

impl From<&PurchaseOrder> for ActiveModel {
    fn from(po: &PurchaseOrder) -> Self {
        Self {
            id: ActiveValue::Set(po.id.to_string()),
            number: ActiveValue::Set(po.number.clone()),
            vendor: ActiveValue::Set(po.vendor.clone()),
            project_id: ActiveValue::Set(po.project_id.clone()),
            amount_minor: ActiveValue::Set(po.amount.cents()),
            status: ActiveValue::Set(po.status.as_str().to_string()),
            description: ActiveValue::Set(po.description.clone()),
            issued_on: ActiveValue::Set(po.issued_on),
            created_by: ActiveValue::Set(po.created_by.clone()),
            idempotency_key: ActiveValue::Set(po.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for PurchaseOrder {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("purchase order not exists".to_string()))?,
            number: model.number,
            vendor: model.vendor,
            project_id: model.project_id,
            amount: MoneyCents::new(model.amount_minor),
            status: PurchaseOrderStatus::try_from(model.status.as_str())?,
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
        use PurchaseOrderStatus::*;
        assert!(Draft.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Paid));
        assert!(!Draft.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Draft));
    }
}
