//! Purchase order store: create, list, read, transitions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    DocumentKind, EngineError, LineItemInput, MoneyCents, PurchaseOrder, PurchaseOrderStatus,
    ResultEngine, purchase_orders,
};

use super::{
    DocumentListFilter, DocumentListing, Engine, normalize_optional_text, normalize_required_text,
    with_tx,
};

/// Payload for creating a purchase order. Same amount semantics as
/// [`super::NewSalesOrder`].
#[derive(Clone, Debug, Default)]
pub struct NewPurchaseOrder {
    pub vendor: String,
    pub project_id: String,
    pub amount: MoneyCents,
    pub items: Vec<LineItemInput>,
    pub description: Option<String>,
    pub issued_on: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
}

impl Engine {
    /// Create a purchase order, drawing the next `PO-…` number.
    pub async fn create_purchase_order(
        &self,
        username: &str,
        cmd: NewPurchaseOrder,
    ) -> ResultEngine<Uuid> {
        let vendor = normalize_required_text(&cmd.vendor, "vendor")?;
        let issued_on = cmd.issued_on.unwrap_or_else(Utc::now);
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_project_write(&db_tx, &cmd.project_id, &user)
                .await?;

            if let Some(key) = &cmd.idempotency_key
                && let Some(existing) = purchase_orders::Entity::find()
                    .filter(purchase_orders::Column::CreatedBy.eq(username))
                    .filter(purchase_orders::Column::IdempotencyKey.eq(key.clone()))
                    .one(&db_tx)
                    .await?
            {
                let existing = PurchaseOrder::try_from(existing)?;
                return Ok(existing.id);
            }

            let amount = self.compute_document_amount(cmd.amount, &cmd.items)?;
            let number = self
                .next_document_number(&db_tx, DocumentKind::PurchaseOrder)
                .await?;
            let order = PurchaseOrder::new(
                number,
                vendor,
                cmd.project_id.clone(),
                amount,
                normalize_optional_text(cmd.description.as_deref()),
                issued_on,
                username.to_string(),
                cmd.idempotency_key.clone(),
            )?;
            purchase_orders::ActiveModel::from(&order)
                .insert(&db_tx)
                .await?;
            self.insert_line_items(
                &db_tx,
                DocumentKind::PurchaseOrder,
                order.id,
                &cmd.project_id,
                &cmd.items,
            )
            .await?;

            Ok(order.id)
        })
    }

    pub async fn purchase_order(&self, username: &str, id: Uuid) -> ResultEngine<PurchaseOrder> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            let model = purchase_orders::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("purchase order not exists".to_string()))?;
            self.require_project_read(&db_tx, &model.project_id, &scope)
                .await?;
            PurchaseOrder::try_from(model)
        })
    }

    pub async fn list_purchase_orders(
        &self,
        username: &str,
        filter: DocumentListFilter,
    ) -> ResultEngine<DocumentListing<PurchaseOrder>> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            self.query_purchase_orders(&db_tx, &scope, &filter).await
        })
    }

    pub async fn approve_purchase_order(
        &self,
        username: &str,
        id: Uuid,
    ) -> ResultEngine<PurchaseOrder> {
        self.transition_purchase_order(username, id, PurchaseOrderStatus::Approved)
            .await
    }

    pub async fn mark_purchase_order_paid(
        &self,
        username: &str,
        id: Uuid,
    ) -> ResultEngine<PurchaseOrder> {
        self.transition_purchase_order(username, id, PurchaseOrderStatus::Paid)
            .await
    }

    /// draft → approved → paid; no ledger effect (cost is recognized on
    /// the vendor bill, not the order).
    async fn transition_purchase_order(
        &self,
        username: &str,
        id: Uuid,
        target: PurchaseOrderStatus,
    ) -> ResultEngine<PurchaseOrder> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let model = purchase_orders::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("purchase order not exists".to_string()))?;
            self.require_project_write(&db_tx, &model.project_id, &user)
                .await?;

            let mut order = PurchaseOrder::try_from(model)?;
            if order.status == target {
                return Ok(order);
            }
            if !order.status.can_transition_to(target) {
                return Err(EngineError::InvalidTransition(format!(
                    "purchase order {} -> {}",
                    order.status.as_str(),
                    target.as_str()
                )));
            }

            let active = purchase_orders::ActiveModel {
                id: ActiveValue::Set(order.id.to_string()),
                status: ActiveValue::Set(target.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            order.status = target;
            Ok(order)
        })
    }
}
