//! Item persistence.
//!
//! An item's categories live in `catalog.item_categories`. They are read
//! back as an ordered array alongside the item row and rewritten in the
//! same transaction as the item itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use catalog_core::{BrandId, CategoryId, ItemId};

use super::{
    Collection, ListOrder, PgCatalogStore, Projection, StoreError, image_columns,
    image_from_columns,
};
use crate::models::{Item, ItemDraft, ItemFilter};
use crate::services::catalog::CatalogEntity;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for item queries.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i32,
    title: String,
    description: String,
    product_id: i64,
    brand_id: i32,
    category_ids: Vec<i32>,
    image_file_name: Option<String>,
    image_content_type: Option<String>,
    image_data: Option<Vec<u8>>,
    protected: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId::new(row.id),
            title: row.title,
            description: row.description,
            product_id: row.product_id,
            brand_id: BrandId::new(row.brand_id),
            category_ids: row.category_ids.into_iter().map(CategoryId::new).collect(),
            image: image_from_columns(row.image_file_name, row.image_content_type, row.image_data),
            protected: row.protected,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Timestamps returned by item writes.
#[derive(Debug, sqlx::FromRow)]
struct WrittenRow {
    id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// =============================================================================
// Links
// =============================================================================

/// Replace an item's category links, keeping submission order.
async fn write_links(
    tx: &mut Transaction<'_, Postgres>,
    item_id: ItemId,
    category_ids: &[CategoryId],
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM catalog.item_categories WHERE item_id = $1")
        .bind(item_id.as_i32())
        .execute(&mut **tx)
        .await?;

    if category_ids.is_empty() {
        return Ok(());
    }

    let ids: Vec<i32> = category_ids.iter().map(CategoryId::as_i32).collect();
    sqlx::query(
        r"
        INSERT INTO catalog.item_categories (item_id, category_id, position)
        SELECT $1, link.category_id, link.position
        FROM UNNEST($2::int4[]) WITH ORDINALITY AS link(category_id, position)
        ",
    )
    .bind(item_id.as_i32())
    .bind(&ids)
    .execute(&mut **tx)
    .await
    .map_err(StoreError::from_write)?;

    Ok(())
}

// =============================================================================
// Collection
// =============================================================================

#[async_trait]
impl Collection<Item> for PgCatalogStore {
    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT i.id, i.title, i.description, i.product_id, i.brand_id,
                   ARRAY(
                       SELECT ic.category_id FROM catalog.item_categories ic
                       WHERE ic.item_id = i.id
                       ORDER BY ic.position
                   ) AS category_ids,
                   i.image_file_name, i.image_content_type, i.image_data,
                   i.protected, i.created_at, i.updated_at
            FROM catalog.items i
            WHERE i.id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_many(
        &self,
        filter: &ItemFilter,
        order: ListOrder,
        projection: Projection,
    ) -> Result<Vec<Item>, StoreError> {
        let order_by = match order {
            ListOrder::Unsorted => "i.id",
            ListOrder::ByLabel => "i.title, i.id",
        };
        let sql = format!(
            r"
            SELECT i.id, i.title, i.description, i.product_id, i.brand_id,
                   ARRAY(
                       SELECT ic.category_id FROM catalog.item_categories ic
                       WHERE ic.item_id = i.id
                       ORDER BY ic.position
                   ) AS category_ids,
                   i.image_file_name, i.image_content_type, {image_data},
                   i.protected, i.created_at, i.updated_at
            FROM catalog.items i
            WHERE ($1::int4 IS NULL OR i.brand_id = $1)
              AND ($2::int4 IS NULL OR EXISTS (
                  SELECT 1 FROM catalog.item_categories f
                  WHERE f.item_id = i.id AND f.category_id = $2
              ))
            ORDER BY {order_by}
            ",
            image_data = projection.image_data("i.image_data"),
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(filter.brand.map(|id| id.as_i32()))
            .bind(filter.category.map(|id| id.as_i32()))
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, draft: ItemDraft) -> Result<Item, StoreError> {
        let mut tx = self.pool().begin().await?;
        let (file_name, content_type, data) = image_columns(draft.image.as_ref());
        let written = sqlx::query_as::<_, WrittenRow>(
            r"
            INSERT INTO catalog.items (
                title, description, product_id, brand_id,
                image_file_name, image_content_type, image_data, protected
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at, updated_at
            ",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.product_id)
        .bind(draft.brand_id.as_i32())
        .bind(file_name)
        .bind(content_type)
        .bind(data)
        .bind(draft.protected)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::from_write)?;

        let id = ItemId::new(written.id);
        write_links(&mut tx, id, &draft.category_ids).await?;
        tx.commit().await?;

        Ok(Item::materialize(
            id,
            draft,
            written.created_at,
            written.updated_at,
        ))
    }

    async fn replace_by_id(&self, id: ItemId, draft: ItemDraft) -> Result<Option<Item>, StoreError> {
        let mut tx = self.pool().begin().await?;
        let (file_name, content_type, data) = image_columns(draft.image.as_ref());
        let written = sqlx::query_as::<_, WrittenRow>(
            r"
            UPDATE catalog.items
            SET title = $2,
                description = $3,
                product_id = $4,
                brand_id = $5,
                image_file_name = $6,
                image_content_type = $7,
                image_data = $8,
                protected = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.product_id)
        .bind(draft.brand_id.as_i32())
        .bind(file_name)
        .bind(content_type)
        .bind(data)
        .bind(draft.protected)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::from_write)?;

        let Some(written) = written else {
            tx.rollback().await?;
            return Ok(None);
        };

        write_links(&mut tx, id, &draft.category_ids).await?;
        tx.commit().await?;

        Ok(Some(Item::materialize(
            id,
            draft,
            written.created_at,
            written.updated_at,
        )))
    }

    async fn delete_by_id(&self, id: ItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM catalog.items WHERE id = $1 AND NOT protected")
            .bind(id.as_i32())
            .execute(self.pool())
            .await
            .map_err(StoreError::from_write)?;
        Ok(result.rows_affected() > 0)
    }
}
