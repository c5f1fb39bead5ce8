//! Document number sequencer.
//!
//! Numbers are drawn from the `sequences` table with an atomic
//! read-modify-write inside the caller's DB transaction, so concurrent
//! creators of the same document kind never collide.

use sea_orm::{DatabaseTransaction, Statement, prelude::*};

use crate::{DocumentKind, EngineError, ResultEngine, sequences};

use super::Engine;

impl Engine {
    pub(super) async fn next_document_number(
        &self,
        db_tx: &DatabaseTransaction,
        kind: DocumentKind,
    ) -> ResultEngine<String> {
        let backend = db_tx.get_database_backend();
        let updated = db_tx
            .execute(Statement::from_sql_and_values(
                backend,
                "UPDATE sequences SET next_value = next_value + 1 WHERE doc_type = ?;",
                vec![kind.as_str().into()],
            ))
            .await?;
        if updated.rows_affected() != 1 {
            return Err(EngineError::NotFound(format!(
                "sequence not exists: {}",
                kind.as_str()
            )));
        }

        let row = sequences::Entity::find_by_id(kind.as_str().to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("sequence not exists: {}", kind.as_str()))
            })?;

        // next_value already points past the number we just claimed.
        Ok(kind.format_number(row.next_value - 1))
    }
}
