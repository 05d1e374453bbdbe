// src/db/inventory_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use super::{closed_session_error, counts_by_item, duplicate_sku_error, InventoryStore, ItemFilter};
use crate::{
    common::error::AppError,
    models::inventory::{
        AddSessionLineRequest, CurrentStock, InventoryItem, InventoryItemRequest,
        InventorySession, InventorySessionLine, SessionStatus,
    },
};

// `sku` tem UNIQUE no banco
fn sku_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return duplicate_sku_error();
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de saldo (rodam dentro da transação de quem chama)
    // ---

    /// Soma `delta` ao saldo (item, local), criando a linha se não existir.
    pub async fn adjust_stock<'e, E>(
        executor: E,
        item_id: Uuid,
        location_id: Uuid,
        delta: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO current_stock (item_id, location_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_id, location_id) DO UPDATE
            SET quantity = current_stock.quantity + EXCLUDED.quantity,
                last_updated = NOW()
            "#,
        )
        .bind(item_id)
        .bind(location_id)
        .bind(delta)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Substitui o saldo (item, local) pela contagem.
    pub async fn set_stock<'e, E>(
        executor: E,
        item_id: Uuid,
        location_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO current_stock (item_id, location_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_id, location_id) DO UPDATE
            SET quantity = EXCLUDED.quantity,
                last_updated = NOW()
            "#,
        )
        .bind(item_id)
        .bind(location_id)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(())
    }

    async fn lines_of<'e, E>(executor: E, session_id: Uuid) -> Result<Vec<InventorySessionLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, InventorySessionLine>(
            "SELECT * FROM inventory_session_lines WHERE session_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(executor)
        .await?;
        Ok(lines)
    }

    // Trava a linha da sessão até o fim da transação
    async fn lock_session<'e, E>(executor: E, session_id: Uuid) -> Result<InventorySession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InventorySession>(
            "SELECT * FROM inventory_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(session_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("Inventory session"))
    }
}

#[async_trait]
impl InventoryStore for InventoryRepository {
    // ---
    // Catálogo
    // ---

    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<InventoryItem>, AppError> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT * FROM inventory_items
            WHERE ($1::boolean IS NULL OR is_active = $1)
              AND ($2::uuid IS NULL OR default_location_id = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(filter.active)
        .bind(filter.location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<InventoryItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn create_item(&self, payload: &InventoryItemRequest) -> Result<InventoryItem, AppError> {
        sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items
                (name, category, unit, par_stock_level, default_location_id, sku, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(payload.category)
        .bind(&payload.unit)
        .bind(payload.par_stock_level)
        .bind(payload.default_location_id)
        .bind(&payload.sku)
        .bind(&payload.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(sku_violation)
    }

    async fn update_item(
        &self,
        id: Uuid,
        payload: &InventoryItemRequest,
    ) -> Result<Option<InventoryItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET name = $2, category = $3, unit = $4, par_stock_level = $5,
                default_location_id = $6, sku = $7, notes = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(payload.category)
        .bind(&payload.unit)
        .bind(payload.par_stock_level)
        .bind(payload.default_location_id)
        .bind(&payload.sku)
        .bind(&payload.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(sku_violation)?;
        Ok(item)
    }

    async fn deactivate_item(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE inventory_items SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Saldo atual
    // ---

    async fn list_stock(
        &self,
        location_id: Option<Uuid>,
        item_id: Option<Uuid>,
    ) -> Result<Vec<CurrentStock>, AppError> {
        let stock = sqlx::query_as::<_, CurrentStock>(
            r#"
            SELECT * FROM current_stock
            WHERE ($1::uuid IS NULL OR location_id = $1)
              AND ($2::uuid IS NULL OR item_id = $2)
            ORDER BY last_updated DESC
            "#,
        )
        .bind(location_id)
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stock)
    }

    // ---
    // Sessões de contagem
    // ---

    async fn list_sessions(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<InventorySession>, AppError> {
        let sessions = sqlx::query_as::<_, InventorySession>(
            r#"
            SELECT * FROM inventory_sessions
            WHERE ($1::uuid IS NULL OR location_id = $1)
            ORDER BY started_at DESC
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<InventorySession>, AppError> {
        let session = sqlx::query_as::<_, InventorySession>(
            "SELECT * FROM inventory_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match session {
            Some(mut session) => {
                session.lines = Self::lines_of(&self.pool, id).await?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn create_session(
        &self,
        location_id: Uuid,
        started_by: Uuid,
    ) -> Result<InventorySession, AppError> {
        let session = sqlx::query_as::<_, InventorySession>(
            r#"
            INSERT INTO inventory_sessions (location_id, started_by, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(location_id)
        .bind(started_by)
        .bind(SessionStatus::Draft)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn add_lines(
        &self,
        session_id: Uuid,
        lines: &[AddSessionLineRequest],
    ) -> Result<Vec<InventorySessionLine>, AppError> {
        let mut tx = self.pool.begin().await?;

        let session = Self::lock_session(&mut *tx, session_id).await?;
        if session.is_closed() {
            return Err(closed_session_error());
        }

        let mut created = Vec::with_capacity(lines.len());
        for line in lines {
            let row = sqlx::query_as::<_, InventorySessionLine>(
                r#"
                INSERT INTO inventory_session_lines
                    (session_id, item_id, count, unit, note, photo_url)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(session_id)
            .bind(line.item_id)
            .bind(line.count)
            .bind(&line.unit)
            .bind(&line.note)
            .bind(&line.photo_url)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn close_session(
        &self,
        session_id: Uuid,
        closed_by: Uuid,
        notes: Option<String>,
    ) -> Result<InventorySession, AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let session = Self::lock_session(&mut *tx, session_id).await?;
        if session.is_closed() {
            return Err(AppError::Conflict("Session is already closed".into()));
        }

        let lines = Self::lines_of(&mut *tx, session_id).await?;
        if lines.is_empty() {
            return Err(AppError::Conflict("Cannot close session without any line items".into()));
        }

        for (item_id, count) in counts_by_item(&lines) {
            Self::set_stock(&mut *tx, item_id, session.location_id, count).await?;
        }

        let mut closed = sqlx::query_as::<_, InventorySession>(
            r#"
            UPDATE inventory_sessions
            SET status = $2, closed_by = $3, closed_at = NOW(), notes = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(SessionStatus::Closed)
        .bind(closed_by)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        closed.lines = lines;
        Ok(closed)
    }
}
