//! Item instance persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use catalog_core::{ItemId, ItemInstanceId, Price};

use super::{Collection, ListOrder, PgCatalogStore, Projection, StoreError};
use crate::models::{ItemInstance, ItemInstanceDraft, ItemInstanceFilter};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for item instance queries.
#[derive(Debug, sqlx::FromRow)]
struct ItemInstanceRow {
    id: i32,
    size: String,
    price: Decimal,
    in_stock: i32,
    item_id: i32,
    protected: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemInstanceRow> for ItemInstance {
    type Error = StoreError;

    fn try_from(row: ItemInstanceRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            StoreError::DataCorruption(format!("item instance {}: {e}", row.id))
        })?;
        Ok(Self {
            id: ItemInstanceId::new(row.id),
            size: row.size,
            price,
            in_stock: row.in_stock,
            item_id: ItemId::new(row.item_id),
            protected: row.protected,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Collection
// =============================================================================

#[async_trait]
impl Collection<ItemInstance> for PgCatalogStore {
    async fn find_by_id(&self, id: ItemInstanceId) -> Result<Option<ItemInstance>, StoreError> {
        let row = sqlx::query_as::<_, ItemInstanceRow>(
            r"
            SELECT id, size, price, in_stock, item_id, protected, created_at, updated_at
            FROM catalog.item_instances
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_many(
        &self,
        filter: &ItemInstanceFilter,
        order: ListOrder,
        _projection: Projection,
    ) -> Result<Vec<ItemInstance>, StoreError> {
        let sql = match order {
            ListOrder::Unsorted => {
                r"
                SELECT id, size, price, in_stock, item_id, protected, created_at, updated_at
                FROM catalog.item_instances
                WHERE ($1::int4 IS NULL OR item_id = $1)
                ORDER BY id
                "
            }
            ListOrder::ByLabel => {
                r"
                SELECT id, size, price, in_stock, item_id, protected, created_at, updated_at
                FROM catalog.item_instances
                WHERE ($1::int4 IS NULL OR item_id = $1)
                ORDER BY size, id
                "
            }
        };
        let rows = sqlx::query_as::<_, ItemInstanceRow>(sql)
            .bind(filter.item.map(|id| id.as_i32()))
            .fetch_all(self.pool())
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert(&self, draft: ItemInstanceDraft) -> Result<ItemInstance, StoreError> {
        let row = sqlx::query_as::<_, ItemInstanceRow>(
            r"
            INSERT INTO catalog.item_instances (size, price, in_stock, item_id, protected)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, size, price, in_stock, item_id, protected, created_at, updated_at
            ",
        )
        .bind(&draft.size)
        .bind(draft.price.amount())
        .bind(draft.in_stock)
        .bind(draft.item_id.as_i32())
        .bind(draft.protected)
        .fetch_one(self.pool())
        .await
        .map_err(StoreError::from_write)?;

        row.try_into()
    }

    async fn replace_by_id(
        &self,
        id: ItemInstanceId,
        draft: ItemInstanceDraft,
    ) -> Result<Option<ItemInstance>, StoreError> {
        let row = sqlx::query_as::<_, ItemInstanceRow>(
            r"
            UPDATE catalog.item_instances
            SET size = $2,
                price = $3,
                in_stock = $4,
                item_id = $5,
                protected = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, size, price, in_stock, item_id, protected, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(&draft.size)
        .bind(draft.price.amount())
        .bind(draft.in_stock)
        .bind(draft.item_id.as_i32())
        .bind(draft.protected)
        .fetch_optional(self.pool())
        .await
        .map_err(StoreError::from_write)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete_by_id(&self, id: ItemInstanceId) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM catalog.item_instances WHERE id = $1 AND NOT protected")
                .bind(id.as_i32())
                .execute(self.pool())
                .await
                .map_err(StoreError::from_write)?;
        Ok(result.rows_affected() > 0)
    }
}
