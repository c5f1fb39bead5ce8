//! Customer invoices: the billable documents recognized as revenue once
//! paid. Line items may be copied from a sales order or appended by the
//! expense attachment path; either way each row keeps a back-reference to
//! its source.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, LineItem, MoneyCents, ResultEngine};

/// Two-state lattice: draft → paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Paid => "paid",
        }
    }

    pub fn can_transition_to(self, target: InvoiceStatus) -> bool {
        matches!((self, target), (Self::Draft, Self::Paid))
    }
}

impl TryFrom<&str> for InvoiceStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::Validation(format!(
                "invalid invoice status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub customer: String,
    pub project_id: String,
    pub amount: MoneyCents,
    pub status: InvoiceStatus,
    /// The sales order this invoice was converted from, if any.
    pub sales_order_id: Option<Uuid>,
    pub issued_on: DateTime<Utc>,
    pub created_by: String,
    pub idempotency_key: Option<String>,
    pub line_items: Vec<LineItem>,
}

impl Invoice {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: String,
        customer: String,
        project_id: String,
        amount: MoneyCents,
        sales_order_id: Option<Uuid>,
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
            status: InvoiceStatus::Draft,
            sales_order_id,
            issued_on,
            created_by,
            idempotency_key,
            line_items: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customer_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub number: String,
    pub customer: String,
    pub project_id: String,
    pub amount_minor: i64,
    pub status: String,
    pub sales_order_id: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::sales_orders::Entity",
        from = "Column::SalesOrderId",
        to = "super::sales_orders::Column::Id"
    )]
    SalesOrder,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Invoice> for ActiveModel {
    fn from(inv: &Invoice) -> Self {
        Self {
            id: ActiveValue::Set(inv.id.to_string()),
            number: ActiveValue::Set(inv.number.clone()),
            customer: ActiveValue::Set(inv.customer.clone()),
            project_id: ActiveValue::Set(inv.project_id.clone()),
            amount_minor: ActiveValue::Set(inv.amount.cents()),
            status: ActiveValue::Set(inv.status.as_str().to_string()),
            sales_order_id: ActiveValue::Set(inv.sales_order_id.map(|id| id.to_string())),
            issued_on: ActiveValue::Set(inv.issued_on),
            created_by: ActiveValue::Set(inv.created_by.clone()),
            idempotency_key: ActiveValue::Set(inv.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for Invoice {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("invoice not exists".to_string()))?,
            number: model.number,
            customer: model.customer,
            project_id: model.project_id,
            amount: MoneyCents::new(model.amount_minor),
            status: InvoiceStatus::try_from(model.status.as_str())?,
            sales_order_id: model.sales_order_id.and_then(|s| Uuid::parse_str(&s).ok()),
            issued_on: model.issued_on,
            created_by: model.created_by,
            idempotency_key: model.idempotency_key,
            line_items: Vec::new(),
        })
    }
}
