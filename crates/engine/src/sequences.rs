//! Per-document-type number counters.
//!
//! One row per [`DocumentKind`]; `next_value` is bumped with a single
//! atomic read-modify-write inside the caller's transaction, so counters
//! survive restarts and stay unique under concurrent creators.
//!
//! [`DocumentKind`]: crate::DocumentKind

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub doc_type: String,
    pub next_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
