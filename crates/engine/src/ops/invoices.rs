//! Customer invoice store: create, list, read, paid transition.
//!
//! Marking an invoice paid is the only edge that recognizes revenue; the
//! rollup runs in the same DB transaction as the status change.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    DocumentKind, EngineError, Invoice, InvoiceStatus, LineItem, LineItemInput, MoneyCents,
    ResultEngine, invoices, line_items,
};

use super::{DocumentListFilter, DocumentListing, Engine, normalize_required_text, with_tx};

/// Payload for creating an invoice directly (not via sales order
/// conversion).
#[derive(Clone, Debug, Default)]
pub struct NewInvoice {
    pub customer: String,
    pub project_id: String,
    pub amount: MoneyCents,
    pub items: Vec<LineItemInput>,
    pub issued_on: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
}

impl Engine {
    /// Create a draft invoice, drawing the next `INV-…` number.
    pub async fn create_invoice(&self, username: &str, cmd: NewInvoice) -> ResultEngine<Uuid> {
        let customer = normalize_required_text(&cmd.customer, "customer")?;
        let issued_on = cmd.issued_on.unwrap_or_else(Utc::now);
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_project_write(&db_tx, &cmd.project_id, &user)
                .await?;

            if let Some(key) = &cmd.idempotency_key
                && let Some(existing) = invoices::Entity::find()
                    .filter(invoices::Column::CreatedBy.eq(username))
                    .filter(invoices::Column::IdempotencyKey.eq(key.clone()))
                    .one(&db_tx)
                    .await?
            {
                let existing = Invoice::try_from(existing)?;
                return Ok(existing.id);
            }

            let amount = self.compute_document_amount(cmd.amount, &cmd.items)?;
            let number = self
                .next_document_number(&db_tx, DocumentKind::Invoice)
                .await?;
            let invoice = Invoice::new(
                number,
                customer,
                cmd.project_id.clone(),
                amount,
                None,
                issued_on,
                username.to_string(),
                cmd.idempotency_key.clone(),
            )?;
            invoices::ActiveModel::from(&invoice).insert(&db_tx).await?;
            self.insert_line_items(
                &db_tx,
                DocumentKind::Invoice,
                invoice.id,
                &cmd.project_id,
                &cmd.items,
            )
            .await?;

            Ok(invoice.id)
        })
    }

    /// Return one invoice with its line items hydrated.
    pub async fn invoice(&self, username: &str, id: Uuid) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            let model = invoices::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("invoice not exists".to_string()))?;
            self.require_project_read(&db_tx, &model.project_id, &scope)
                .await?;

            let mut invoice = Invoice::try_from(model)?;
            invoice.line_items = self
                .invoice_line_items(&db_tx, invoice.id)
                .await?;
            Ok(invoice)
        })
    }

    pub async fn list_invoices(
        &self,
        username: &str,
        filter: DocumentListFilter,
    ) -> ResultEngine<DocumentListing<Invoice>> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            self.query_invoices(&db_tx, &scope, &filter).await
        })
    }

    /// Mark an invoice paid and recognize its amount as project revenue.
    ///
    /// Repeat calls are no-op successes: the ledger moves exactly once.
    pub async fn mark_invoice_paid(&self, username: &str, id: Uuid) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let model = invoices::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("invoice not exists".to_string()))?;
            self.require_project_write(&db_tx, &model.project_id, &user)
                .await?;

            let mut invoice = Invoice::try_from(model)?;
            if invoice.status == InvoiceStatus::Paid {
                return Ok(invoice);
            }

            let active = invoices::ActiveModel {
                id: ActiveValue::Set(invoice.id.to_string()),
                status: ActiveValue::Set(InvoiceStatus::Paid.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            self.apply_revenue(&db_tx, &invoice.project_id, invoice.amount)
                .await?;
            invoice.status = InvoiceStatus::Paid;
            Ok(invoice)
        })
    }

    pub(super) async fn invoice_line_items(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        invoice_id: Uuid,
    ) -> ResultEngine<Vec<LineItem>> {
        let models = line_items::Entity::find()
            .filter(line_items::Column::DocumentKind.eq(DocumentKind::Invoice.as_str()))
            .filter(line_items::Column::DocumentId.eq(invoice_id.to_string()))
            .order_by_asc(line_items::Column::Position)
            .all(db_tx)
            .await?;
        models
            .into_iter()
            .map(LineItem::try_from)
            .collect::<ResultEngine<Vec<_>>>()
    }
}
