//! Links between documents: sales order → invoice conversion and
//! billable expense → draft invoice attachment.

use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    DocumentKind, EngineError, Expense, Invoice, InvoiceStatus, LineItem, MoneyCents,
    ResultEngine, SalesOrder, invoices, line_items, sales_orders,
};

use super::{Engine, with_tx};

/// Result of a sales order conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertedInvoice {
    pub invoice_id: Uuid,
    pub number: String,
    pub amount: MoneyCents,
}

impl Engine {
    /// Convert a sales order into a draft invoice.
    ///
    /// One transaction: draw the next `INV-…` number, copy the order's
    /// line items re-tagged with back-references, and stamp
    /// `converted_invoice_id` on the order. A second conversion attempt is
    /// a conflict; the stamp is what makes the operation single-shot.
    pub async fn convert_sales_order_to_invoice(
        &self,
        username: &str,
        sales_order_id: Uuid,
    ) -> ResultEngine<ConvertedInvoice> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let model = sales_orders::Entity::find_by_id(sales_order_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("sales order not exists".to_string()))?;
            self.require_project_write(&db_tx, &model.project_id, &user)
                .await?;

            let order = SalesOrder::try_from(model)?;
            if order.converted_invoice_id.is_some() {
                return Err(EngineError::Conflict(
                    "sales order already converted".to_string(),
                ));
            }

            let number = self
                .next_document_number(&db_tx, DocumentKind::Invoice)
                .await?;
            let invoice = Invoice::new(
                number.clone(),
                order.customer.clone(),
                order.project_id.clone(),
                order.amount,
                Some(order.id),
                Utc::now(),
                username.to_string(),
                None,
            )?;
            invoices::ActiveModel::from(&invoice).insert(&db_tx).await?;

            let item_models = line_items::Entity::find()
                .filter(line_items::Column::DocumentKind.eq(DocumentKind::SalesOrder.as_str()))
                .filter(line_items::Column::DocumentId.eq(order.id.to_string()))
                .order_by_asc(line_items::Column::Position)
                .all(&db_tx)
                .await?;
            for model in item_models {
                let mut item = LineItem::try_from(model)?;
                item.id = Uuid::new_v4();
                item.project_id = Some(order.project_id.clone());
                item.sales_order_id = Some(order.id);
                item.into_active_model(DocumentKind::Invoice, invoice.id)
                    .insert(&db_tx)
                    .await?;
            }

            let stamp = sales_orders::ActiveModel {
                id: ActiveValue::Set(order.id.to_string()),
                converted_invoice_id: ActiveValue::Set(Some(invoice.id.to_string())),
                ..Default::default()
            };
            stamp.update(&db_tx).await?;

            Ok(ConvertedInvoice {
                invoice_id: invoice.id,
                number,
                amount: invoice.amount,
            })
        })
    }

    /// Attach an approved billable expense to the project's open draft
    /// invoice, creating one when none exists.
    ///
    /// Runs in its own transaction, after the approval has committed.
    /// Returns the invoice id and whether it was created here.
    pub(super) async fn attach_expense_to_invoice(
        &self,
        expense: &Expense,
    ) -> ResultEngine<(Uuid, bool)> {
        with_tx!(self, |db_tx| {
            let project = self.find_project(&db_tx, &expense.project_id).await?;

            let draft = invoices::Entity::find()
                .filter(invoices::Column::ProjectId.eq(expense.project_id.clone()))
                .filter(invoices::Column::Status.eq(InvoiceStatus::Draft.as_str()))
                .order_by_desc(invoices::Column::IssuedOn)
                .one(&db_tx)
                .await?;

            let (invoice, created) = match draft {
                Some(model) => (Invoice::try_from(model)?, false),
                None => {
                    let number = self
                        .next_document_number(&db_tx, DocumentKind::Invoice)
                        .await?;
                    let customer = project
                        .client
                        .clone()
                        .unwrap_or_else(|| "General".to_string());
                    let invoice = Invoice::new(
                        number,
                        customer,
                        expense.project_id.clone(),
                        MoneyCents::ZERO,
                        None,
                        Utc::now(),
                        expense.submitted_by.clone(),
                        None,
                    )?;
                    invoices::ActiveModel::from(&invoice).insert(&db_tx).await?;
                    (invoice, true)
                }
            };

            let position = line_items::Entity::find()
                .filter(line_items::Column::DocumentKind.eq(DocumentKind::Invoice.as_str()))
                .filter(line_items::Column::DocumentId.eq(invoice.id.to_string()))
                .count(&db_tx)
                .await?;
            let item = LineItem {
                id: Uuid::new_v4(),
                position: position as u32,
                description: Some(expense.description.clone()),
                product: None,
                quantity: 1.0,
                unit_price: expense.amount,
                tax_rate: 0.0,
                total: expense.amount,
                project_id: Some(expense.project_id.clone()),
                sales_order_id: None,
                expense_id: Some(expense.id),
            };
            item.into_active_model(DocumentKind::Invoice, invoice.id)
                .insert(&db_tx)
                .await?;

            let new_amount = invoice
                .amount
                .checked_add(expense.amount)
                .ok_or_else(|| EngineError::InvalidAmount("invoice amount overflow".to_string()))?;
            let bump = invoices::ActiveModel {
                id: ActiveValue::Set(invoice.id.to_string()),
                amount_minor: ActiveValue::Set(new_amount.cents()),
                ..Default::default()
            };
            bump.update(&db_tx).await?;

            let billed = crate::expenses::ActiveModel {
                id: ActiveValue::Set(expense.id.to_string()),
                billed: ActiveValue::Set(true),
                billed_at: ActiveValue::Set(Some(Utc::now())),
                invoice_id: ActiveValue::Set(Some(invoice.id.to_string())),
                ..Default::default()
            };
            billed.update(&db_tx).await?;

            Ok((invoice.id, created))
        })
    }
}
