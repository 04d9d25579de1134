//! Category persistence.
//!
//! Names are stored already uppercased; the unique index on `name` backs
//! the service's existence check and surfaces as `StoreError::Duplicate`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use catalog_core::CategoryId;

use super::{
    Collection, ListOrder, PgCatalogStore, Projection, StoreError, image_columns,
    image_from_columns,
};
use crate::models::{Category, CategoryDraft, CategoryFilter};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for category queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: String,
    item_count: i32,
    image_file_name: Option<String>,
    image_content_type: Option<String>,
    image_data: Option<Vec<u8>>,
    protected: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            item_count: row.item_count,
            image: image_from_columns(row.image_file_name, row.image_content_type, row.image_data),
            protected: row.protected,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Collection
// =============================================================================

#[async_trait]
impl Collection<Category> for PgCatalogStore {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, item_count,
                   image_file_name, image_content_type, image_data,
                   protected, created_at, updated_at
            FROM catalog.categories
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_many(
        &self,
        filter: &CategoryFilter,
        order: ListOrder,
        projection: Projection,
    ) -> Result<Vec<Category>, StoreError> {
        let order_by = match order {
            ListOrder::Unsorted => "id",
            ListOrder::ByLabel => "name, id",
        };
        let sql = format!(
            r"
            SELECT id, name, description, item_count,
                   image_file_name, image_content_type, {image_data},
                   protected, created_at, updated_at
            FROM catalog.categories
            WHERE ($1::text IS NULL OR name = $1)
            ORDER BY {order_by}
            ",
            image_data = projection.image_data("image_data"),
        );
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(filter.name.as_deref())
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, draft: CategoryDraft) -> Result<Category, StoreError> {
        let (file_name, content_type, data) = image_columns(draft.image.as_ref());
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO catalog.categories (
                name, description,
                image_file_name, image_content_type, image_data, protected
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, item_count,
                      image_file_name, image_content_type, image_data,
                      protected, created_at, updated_at
            ",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(file_name)
        .bind(content_type)
        .bind(data)
        .bind(draft.protected)
        .fetch_one(self.pool())
        .await
        .map_err(StoreError::from_write)?;

        Ok(row.into())
    }

    async fn replace_by_id(
        &self,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<Option<Category>, StoreError> {
        let (file_name, content_type, data) = image_columns(draft.image.as_ref());
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE catalog.categories
            SET name = $2,
                description = $3,
                image_file_name = $4,
                image_content_type = $5,
                image_data = $6,
                protected = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, item_count,
                      image_file_name, image_content_type, image_data,
                      protected, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(file_name)
        .bind(content_type)
        .bind(data)
        .bind(draft.protected)
        .fetch_optional(self.pool())
        .await
        .map_err(StoreError::from_write)?;

        Ok(row.map(Into::into))
    }

    async fn delete_by_id(&self, id: CategoryId) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM catalog.categories WHERE id = $1 AND NOT protected")
                .bind(id.as_i32())
                .execute(self.pool())
                .await
                .map_err(StoreError::from_write)?;
        Ok(result.rows_affected() > 0)
    }
}
