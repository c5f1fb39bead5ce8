//! Line items and the line-item calculator.
//!
//! A line item is one priced row inside a billing document. Its total is
//! `quantity × unit_price × (1 + tax_rate)`, rounded to the cent **before**
//! summation into the document amount; rounding per item first keeps the
//! aggregate reproducible to the penny.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DocumentKind, EngineError, MoneyCents, ResultEngine};

/// Caller-supplied line item, before totals are computed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub description: Option<String>,
    pub product: Option<String>,
    pub quantity: f64,
    pub unit_price: MoneyCents,
    /// Tax as a fraction, e.g. `0.18` for 18%.
    pub tax_rate: f64,
}

/// A stored line item with its computed total and traceability links.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    pub position: u32,
    pub description: Option<String>,
    pub product: Option<String>,
    pub quantity: f64,
    pub unit_price: MoneyCents,
    pub tax_rate: f64,
    pub total: MoneyCents,
    /// Back-reference to the owning project (traceability, not ownership).
    pub project_id: Option<String>,
    /// Invoice items only: the sales order this row was copied from.
    pub sales_order_id: Option<Uuid>,
    /// Invoice items only: the expense this row bills.
    pub expense_id: Option<Uuid>,
}

/// Computes a single item's total in cents.
///
/// Pure and idempotent, so it can back both persistence and previews.
pub fn line_total(quantity: f64, unit_price: MoneyCents, tax_rate: f64) -> ResultEngine<MoneyCents> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(EngineError::Validation(
            "line item quantity must be >= 0".to_string(),
        ));
    }
    if unit_price.is_negative() {
        return Err(EngineError::Validation(
            "line item unit price must be >= 0".to_string(),
        ));
    }
    if !tax_rate.is_finite() || tax_rate < 0.0 {
        return Err(EngineError::Validation(
            "line item tax rate must be >= 0".to_string(),
        ));
    }
    let raw = quantity * unit_price.cents() as f64 * (1.0 + tax_rate);
    Ok(MoneyCents::new(raw.round() as i64))
}

/// Computes the document amount as the sum of per-item totals.
///
/// Item-level rounding happens in [`line_total`], before summation.
pub fn document_amount(items: &[LineItemInput]) -> ResultEngine<MoneyCents> {
    let mut sum = MoneyCents::ZERO;
    for item in items {
        let total = line_total(item.quantity, item.unit_price, item.tax_rate)?;
        sum = sum
            .checked_add(total)
            .ok_or_else(|| EngineError::InvalidAmount("document amount overflow".to_string()))?;
    }
    Ok(sum)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub document_kind: String,
    pub document_id: String,
    pub position: i32,
    pub description: Option<String>,
    pub product: Option<String>,
    pub quantity: f64,
    pub unit_price_minor: i64,
    pub tax_rate: f64,
    pub total_minor: i64,
    pub project_id: Option<String>,
    pub sales_order_id: Option<String>,
    pub expense_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl LineItem {
    /// Builds a stored item from caller input, computing its total.
    pub fn from_input(input: &LineItemInput, position: u32) -> ResultEngine<Self> {
        let total = line_total(input.quantity, input.unit_price, input.tax_rate)?;
        Ok(Self {
            id: Uuid::new_v4(),
            position,
            description: input.description.clone(),
            product: input.product.clone(),
            quantity: input.quantity,
            unit_price: input.unit_price,
            tax_rate: input.tax_rate,
            total,
            project_id: None,
            sales_order_id: None,
            expense_id: None,
        })
    }

    pub fn into_active_model(self, kind: DocumentKind, document_id: Uuid) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            document_kind: ActiveValue::Set(kind.as_str().to_string()),
            document_id: ActiveValue::Set(document_id.to_string()),
            position: ActiveValue::Set(self.position as i32),
            description: ActiveValue::Set(self.description),
            product: ActiveValue::Set(self.product),
            quantity: ActiveValue::Set(self.quantity),
            unit_price_minor: ActiveValue::Set(self.unit_price.cents()),
            tax_rate: ActiveValue::Set(self.tax_rate),
            total_minor: ActiveValue::Set(self.total.cents()),
            project_id: ActiveValue::Set(self.project_id),
            sales_order_id: ActiveValue::Set(self.sales_order_id.map(|id| id.to_string())),
            expense_id: ActiveValue::Set(self.expense_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for LineItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("line item not exists".to_string()))?,
            position: model.position.max(0) as u32,
            description: model.description,
            product: model.product,
            quantity: model.quantity,
            unit_price: MoneyCents::new(model.unit_price_minor),
            tax_rate: model.tax_rate,
            total: MoneyCents::new(model.total_minor),
            project_id: model.project_id,
            sales_order_id: model.sales_order_id.and_then(|s| Uuid::parse_str(&s).ok()),
            expense_id: model.expense_id.and_then(|s| Uuid::parse_str(&s).ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: f64, price_minor: i64, tax_rate: f64) -> LineItemInput {
        LineItemInput {
            description: None,
            product: None,
            quantity,
            unit_price: MoneyCents::new(price_minor),
            tax_rate,
        }
    }

    #[test]
    fn total_applies_tax_and_rounds_to_cent() {
        // 10 × 150.00 at 18% = 1770.00
        assert_eq!(
            line_total(10.0, MoneyCents::new(15000), 0.18).unwrap().cents(),
            177000
        );
        // 3 × 0.33 at 0% = 0.99
        assert_eq!(
            line_total(3.0, MoneyCents::new(33), 0.0).unwrap().cents(),
            99
        );
        // 1 × 0.01 at 18% = 0.0118 → 0.01
        assert_eq!(
            line_total(1.0, MoneyCents::new(1), 0.18).unwrap().cents(),
            1
        );
    }

    #[test]
    fn amount_sums_item_totals_rounded_per_item() {
        let items = vec![item(10.0, 15000, 0.18), item(8.0, 15000, 0.18)];
        // 1770.00 + 1416.00 = 3186.00
        assert_eq!(document_amount(&items).unwrap().cents(), 318600);
    }

    #[test]
    fn empty_input_sums_to_zero() {
        assert_eq!(document_amount(&[]).unwrap(), MoneyCents::ZERO);
    }

    #[test]
    fn negative_inputs_are_rejected() {
        assert!(line_total(-1.0, MoneyCents::new(100), 0.0).is_err());
        assert!(line_total(1.0, MoneyCents::new(-100), 0.0).is_err());
        assert!(line_total(1.0, MoneyCents::new(100), -0.1).is_err());
    }
}
