//! Vendor bill store: create, list, read, paid transition.
//!
//! Marking a bill paid recognizes its amount as project cost in the same
//! DB transaction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    DocumentKind, EngineError, LineItemInput, MoneyCents, ResultEngine, VendorBill,
    VendorBillStatus, purchase_orders, vendor_bills,
};

use super::{
    DocumentListFilter, DocumentListing, Engine, normalize_optional_text, normalize_required_text,
    with_tx,
};

/// Payload for recording a vendor bill.
#[derive(Clone, Debug, Default)]
pub struct NewVendorBill {
    pub vendor: String,
    pub project_id: String,
    pub amount: MoneyCents,
    pub items: Vec<LineItemInput>,
    /// Optional link to the purchase order this bill settles.
    pub purchase_order_id: Option<Uuid>,
    pub attachment_url: Option<String>,
    pub issued_on: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
}

impl Engine {
    /// Record a vendor bill, drawing the next `BILL-…` number.
    pub async fn create_vendor_bill(
        &self,
        username: &str,
        cmd: NewVendorBill,
    ) -> ResultEngine<Uuid> {
        let vendor = normalize_required_text(&cmd.vendor, "vendor")?;
        let issued_on = cmd.issued_on.unwrap_or_else(Utc::now);
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_project_write(&db_tx, &cmd.project_id, &user)
                .await?;

            if let Some(key) = &cmd.idempotency_key
                && let Some(existing) = vendor_bills::Entity::find()
                    .filter(vendor_bills::Column::CreatedBy.eq(username))
                    .filter(vendor_bills::Column::IdempotencyKey.eq(key.clone()))
                    .one(&db_tx)
                    .await?
            {
                let existing = VendorBill::try_from(existing)?;
                return Ok(existing.id);
            }

            if let Some(po_id) = cmd.purchase_order_id {
                let exists = purchase_orders::Entity::find_by_id(po_id.to_string())
                    .filter(purchase_orders::Column::ProjectId.eq(cmd.project_id.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if !exists {
                    return Err(EngineError::NotFound(
                        "purchase order not exists".to_string(),
                    ));
                }
            }

            let amount = self.compute_document_amount(cmd.amount, &cmd.items)?;
            let number = self
                .next_document_number(&db_tx, DocumentKind::VendorBill)
                .await?;
            let bill = VendorBill::new(
                number,
                vendor,
                cmd.project_id.clone(),
                amount,
                cmd.purchase_order_id,
                normalize_optional_text(cmd.attachment_url.as_deref()),
                issued_on,
                username.to_string(),
                cmd.idempotency_key.clone(),
            )?;
            vendor_bills::ActiveModel::from(&bill).insert(&db_tx).await?;
            self.insert_line_items(
                &db_tx,
                DocumentKind::VendorBill,
                bill.id,
                &cmd.project_id,
                &cmd.items,
            )
            .await?;

            Ok(bill.id)
        })
    }

    pub async fn vendor_bill(&self, username: &str, id: Uuid) -> ResultEngine<VendorBill> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            let model = vendor_bills::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("vendor bill not exists".to_string()))?;
            self.require_project_read(&db_tx, &model.project_id, &scope)
                .await?;
            VendorBill::try_from(model)
        })
    }

    pub async fn list_vendor_bills(
        &self,
        username: &str,
        filter: DocumentListFilter,
    ) -> ResultEngine<DocumentListing<VendorBill>> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            self.query_vendor_bills(&db_tx, &scope, &filter).await
        })
    }

    /// Mark a bill paid and recognize its amount as project cost.
    ///
    /// Repeat calls are no-op successes: the ledger moves exactly once.
    pub async fn mark_vendor_bill_paid(
        &self,
        username: &str,
        id: Uuid,
    ) -> ResultEngine<VendorBill> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let model = vendor_bills::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("vendor bill not exists".to_string()))?;
            self.require_project_write(&db_tx, &model.project_id, &user)
                .await?;

            let mut bill = VendorBill::try_from(model)?;
            if bill.status == VendorBillStatus::Paid {
                return Ok(bill);
            }

            let active = vendor_bills::ActiveModel {
                id: ActiveValue::Set(bill.id.to_string()),
                status: ActiveValue::Set(VendorBillStatus::Paid.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            self.apply_cost(&db_tx, &bill.project_id, bill.amount)
                .await?;
            bill.status = VendorBillStatus::Paid;
            Ok(bill)
        })
    }
}
