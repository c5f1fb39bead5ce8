//! Sales order store: create, list, read, transitions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    DocumentKind, EngineError, LineItem, LineItemInput, MoneyCents, ResultEngine, SalesOrder,
    SalesOrderStatus, line_items, sales_orders,
};

use super::{
    DocumentListFilter, DocumentListing, Engine, normalize_optional_text, normalize_required_text,
    with_tx,
};

/// Payload for creating a sales order.
///
/// `amount` is used verbatim when `items` is empty; otherwise the amount
/// is computed from the items (per-item rounding before summation).
#[derive(Clone, Debug, Default)]
pub struct NewSalesOrder {
    pub customer: String,
    pub project_id: String,
    pub amount: MoneyCents,
    pub items: Vec<LineItemInput>,
    pub description: Option<String>,
    pub issued_on: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
}

impl Engine {
    /// Create a sales order, drawing the next `SO-…` number.
    ///
    /// A repeated create with the same `(creator, idempotency_key)` returns
    /// the id of the first document instead of inserting a duplicate.
    pub async fn create_sales_order(
        &self,
        username: &str,
        cmd: NewSalesOrder,
    ) -> ResultEngine<Uuid> {
        let customer = normalize_required_text(&cmd.customer, "customer")?;
        let issued_on = cmd.issued_on.unwrap_or_else(Utc::now);
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_project_write(&db_tx, &cmd.project_id, &user)
                .await?;

            if let Some(key) = &cmd.idempotency_key
                && let Some(existing) = sales_orders::Entity::find()
                    .filter(sales_orders::Column::CreatedBy.eq(username))
                    .filter(sales_orders::Column::IdempotencyKey.eq(key.clone()))
                    .one(&db_tx)
                    .await?
            {
                let existing = SalesOrder::try_from(existing)?;
                return Ok(existing.id);
            }

            let amount = self.compute_document_amount(cmd.amount, &cmd.items)?;
            let number = self
                .next_document_number(&db_tx, DocumentKind::SalesOrder)
                .await?;
            let order = SalesOrder::new(
                number,
                customer,
                cmd.project_id.clone(),
                amount,
                normalize_optional_text(cmd.description.as_deref()),
                issued_on,
                username.to_string(),
                cmd.idempotency_key.clone(),
            )?;
            sales_orders::ActiveModel::from(&order).insert(&db_tx).await?;
            self.insert_line_items(
                &db_tx,
                DocumentKind::SalesOrder,
                order.id,
                &cmd.project_id,
                &cmd.items,
            )
            .await?;

            Ok(order.id)
        })
    }

    /// Return one sales order with its line items.
    pub async fn sales_order(&self, username: &str, id: Uuid) -> ResultEngine<SalesOrder> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            let model = sales_orders::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("sales order not exists".to_string()))?;
            self.require_project_read(&db_tx, &model.project_id, &scope)
                .await?;
            SalesOrder::try_from(model)
        })
    }

    /// List sales orders visible to the caller, or aggregation buckets
    /// when the filter carries `group_by`.
    pub async fn list_sales_orders(
        &self,
        username: &str,
        filter: DocumentListFilter,
    ) -> ResultEngine<DocumentListing<SalesOrder>> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            self.query_sales_orders(&db_tx, &scope, &filter).await
        })
    }

    pub async fn confirm_sales_order(&self, username: &str, id: Uuid) -> ResultEngine<SalesOrder> {
        self.transition_sales_order(username, id, SalesOrderStatus::Confirmed)
            .await
    }

    pub async fn mark_sales_order_paid(
        &self,
        username: &str,
        id: Uuid,
    ) -> ResultEngine<SalesOrder> {
        self.transition_sales_order(username, id, SalesOrderStatus::Paid)
            .await
    }

    /// Move a sales order along its lattice (draft → confirmed → paid).
    ///
    /// A transition to the current status is a no-op success. Sales order
    /// transitions never touch the project ledger; revenue is recognized
    /// on the converted invoice.
    async fn transition_sales_order(
        &self,
        username: &str,
        id: Uuid,
        target: SalesOrderStatus,
    ) -> ResultEngine<SalesOrder> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let model = sales_orders::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("sales order not exists".to_string()))?;
            self.require_project_write(&db_tx, &model.project_id, &user)
                .await?;

            let mut order = SalesOrder::try_from(model)?;
            if order.status == target {
                return Ok(order);
            }
            if !order.status.can_transition_to(target) {
                return Err(EngineError::InvalidTransition(format!(
                    "sales order {} -> {}",
                    order.status.as_str(),
                    target.as_str()
                )));
            }

            let active = sales_orders::ActiveModel {
                id: ActiveValue::Set(order.id.to_string()),
                status: ActiveValue::Set(target.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            order.status = target;
            Ok(order)
        })
    }

    pub(super) fn compute_document_amount(
        &self,
        given: MoneyCents,
        items: &[LineItemInput],
    ) -> ResultEngine<MoneyCents> {
        if items.is_empty() {
            if given.is_negative() {
                return Err(EngineError::InvalidAmount(
                    "amount must be >= 0".to_string(),
                ));
            }
            return Ok(given);
        }
        line_items::document_amount(items)
    }

    pub(super) async fn insert_line_items(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        kind: DocumentKind,
        document_id: Uuid,
        project_id: &str,
        items: &[LineItemInput],
    ) -> ResultEngine<()> {
        for (position, input) in items.iter().enumerate() {
            let mut item = LineItem::from_input(input, position as u32)?;
            item.project_id = Some(project_id.to_string());
            item.into_active_model(kind, document_id)
                .insert(db_tx)
                .await?;
        }
        Ok(())
    }
}
