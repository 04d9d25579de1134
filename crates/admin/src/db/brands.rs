//! Brand persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use catalog_core::BrandId;

use super::{
    Collection, ListOrder, PgCatalogStore, Projection, StoreError, image_columns,
    image_from_columns,
};
use crate::models::{Brand, BrandDraft, BrandFilter};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for brand queries.
#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: i32,
    name: String,
    description: String,
    location: String,
    image_file_name: Option<String>,
    image_content_type: Option<String>,
    image_data: Option<Vec<u8>>,
    protected: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Self {
            id: BrandId::new(row.id),
            name: row.name,
            description: row.description,
            location: row.location,
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
impl Collection<Brand> for PgCatalogStore {
    async fn find_by_id(&self, id: BrandId) -> Result<Option<Brand>, StoreError> {
        let row = sqlx::query_as::<_, BrandRow>(
            r"
            SELECT id, name, description, location,
                   image_file_name, image_content_type, image_data,
                   protected, created_at, updated_at
            FROM catalog.brands
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
        _filter: &BrandFilter,
        order: ListOrder,
        projection: Projection,
    ) -> Result<Vec<Brand>, StoreError> {
        let order_by = match order {
            ListOrder::Unsorted => "id",
            ListOrder::ByLabel => "name, id",
        };
        let sql = format!(
            r"
            SELECT id, name, description, location,
                   image_file_name, image_content_type, {image_data},
                   protected, created_at, updated_at
            FROM catalog.brands
            ORDER BY {order_by}
            ",
            image_data = projection.image_data("image_data"),
        );
        let rows = sqlx::query_as::<_, BrandRow>(&sql)
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, draft: BrandDraft) -> Result<Brand, StoreError> {
        let (file_name, content_type, data) = image_columns(draft.image.as_ref());
        let row = sqlx::query_as::<_, BrandRow>(
            r"
            INSERT INTO catalog.brands (
                name, description, location,
                image_file_name, image_content_type, image_data, protected
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, location,
                      image_file_name, image_content_type, image_data,
                      protected, created_at, updated_at
            ",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.location)
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
        id: BrandId,
        draft: BrandDraft,
    ) -> Result<Option<Brand>, StoreError> {
        let (file_name, content_type, data) = image_columns(draft.image.as_ref());
        let row = sqlx::query_as::<_, BrandRow>(
            r"
            UPDATE catalog.brands
            SET name = $2,
                description = $3,
                location = $4,
                image_file_name = $5,
                image_content_type = $6,
                image_data = $7,
                protected = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, location,
                      image_file_name, image_content_type, image_data,
                      protected, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.location)
        .bind(file_name)
        .bind(content_type)
        .bind(data)
        .bind(draft.protected)
        .fetch_optional(self.pool())
        .await
        .map_err(StoreError::from_write)?;

        Ok(row.map(Into::into))
    }

    async fn delete_by_id(&self, id: BrandId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM catalog.brands WHERE id = $1 AND NOT protected")
            .bind(id.as_i32())
            .execute(self.pool())
            .await
            .map_err(StoreError::from_write)?;
        Ok(result.rows_affected() > 0)
    }
}
