//! Vendor bills: payable documents recognized as cost once paid.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Two-state lattice: pending → paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorBillStatus {
    Pending,
    Paid,
}

impl VendorBillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    pub fn can_transition_to(self, target: VendorBillStatus) -> bool {
        matches!((self, target), (Self::Pending, Self::Paid))
    }
}

impl TryFrom<&str> for VendorBillStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::Validation(format!(
                "invalid vendor bill status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorBill {
    pub id: Uuid,
    pub number: String,
    pub vendor: String,
    pub project_id: String,
    pub amount: MoneyCents,
    pub status: VendorBillStatus,
    pub purchase_order_id: Option<Uuid>,
    pub attachment_url: Option<String>,
    pub issued_on: DateTime<Utc>,
    pub created_by: String,
    pub idempotency_key: Option<String>,
}

impl VendorBill {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: String,
        vendor: String,
        project_id: String,
        amount: MoneyCents,
        purchase_order_id: Option<Uuid>,
        attachment_url: Option<String>,
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
            status: VendorBillStatus::Pending,
            purchase_order_id,
            attachment_url,
            issued_on,
            created_by,
            idempotency_key,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vendor_bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub number: String,
    pub vendor: String,
    pub project_id: String,
    pub amount_minor: i64,
    pub status: String,
    pub purchase_order_id: Option<String>,
    pub attachment_url: Option<String>,
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
        belongs_to = "super::purchase_orders::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_orders::Column::Id"
    )]
    PurchaseOrder,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&VendorBill> for ActiveModel {
    fn from(bill: &VendorBill) -> Self {
        Self {
            id: ActiveValue::Set(bill.id.to_string()),
            number: ActiveValue::Set(bill.number.clone()),
            vendor: ActiveValue::Set(bill.vendor.clone()),
            project_id: ActiveValue::Set(bill.project_id.clone()),
            amount_minor: ActiveValue::Set(bill.amount.cents()),
            status: ActiveValue::Set(bill.status.as_str().to_string()),
            purchase_order_id: ActiveValue::Set(bill.purchase_order_id.map(|id| id.to_string())),
            attachment_url: ActiveValue::Set(bill.attachment_url.clone()),
            issued_on: ActiveValue::Set(bill.issued_on),
            created_by: ActiveValue::Set(bill.created_by.clone()),
            idempotency_key: ActiveValue::Set(bill.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for VendorBill {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("vendor bill not exists".to_string()))?,
            number: model.number,
            vendor: model.vendor,
            project_id: model.project_id,
            amount: MoneyCents::new(model.amount_minor),
            status: VendorBillStatus::try_from(model.status.as_str())?,
            purchase_order_id: model
                .purchase_order_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            attachment_url: model.attachment_url,
            issued_on: model.issued_on,
            created_by: model.created_by,
            idempotency_key: model.idempotency_key,
        })
    }
}
