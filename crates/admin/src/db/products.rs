//! Database operations for products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use stern_core::{DeleteMode, ProductId};

use super::{RepositoryError, map_delete_error};
use crate::models::product::{NewProduct, Product, UpdateProductInput};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    product_id: i64,
    name: String,
    category: Option<String>,
    brand: Option<String>,
    description: Option<String>,
    price: Decimal,
    discount_percent: Decimal,
    stock: i32,
    active: bool,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            category: row.category,
            brand: row.brand,
            description: row.description,
            price: row.price,
            discount_percent: row.discount_percent,
            stock: row.stock,
            active: row.active,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "product_id, name, category, brand, description, price, \
     discount_percent, stock, active, image_url, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY created_at DESC, product_id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE product_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Product::from)
        .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product
                (name, price, stock, category, brand, description, discount_percent, image_url, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(product.discount_percent)
        .bind(&product.image_url)
        .bind(product.active)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(product_id = row.product_id, "Product created");
        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// Optional text columns are replaced when present in the input; a blank
    /// value clears them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: ProductId,
        changes: UpdateProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product SET
                name = COALESCE($2, name),
                price = COALESCE($3, price),
                stock = COALESCE($4, stock),
                category = CASE WHEN $5 THEN NULLIF(BTRIM($6), '') ELSE category END,
                brand = CASE WHEN $7 THEN NULLIF(BTRIM($8), '') ELSE brand END,
                description = CASE WHEN $9 THEN NULLIF(BTRIM($10), '') ELSE description END,
                discount_percent = COALESCE($11, discount_percent),
                image_url = CASE WHEN $12 THEN NULLIF(BTRIM($13), '') ELSE image_url END,
                active = COALESCE($14, active),
                updated_at = NOW()
            WHERE product_id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.price)
        .bind(changes.stock)
        .bind(changes.category.is_some())
        .bind(&changes.category)
        .bind(changes.brand.is_some())
        .bind(&changes.brand)
        .bind(changes.description.is_some())
        .bind(&changes.description)
        .bind(changes.discount_percent)
        .bind(changes.image_url.is_some())
        .bind(&changes.image_url)
        .bind(changes.active)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))?;

        Ok(row.into())
    }

    /// Delete or deactivate a product.
    ///
    /// A hard delete of a product that appears on order lines, returns or
    /// reviews fails with an `FK_CONSTRAINT` conflict. It is never turned
    /// into a soft delete here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id, or
    /// `RepositoryError::Conflict` if a hard delete is blocked.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId, mode: DeleteMode) -> Result<(), RepositoryError> {
        let result = match mode {
            DeleteMode::Hard => sqlx::query("DELETE FROM shop.product WHERE product_id = $1")
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| map_delete_error(e, "product"))?,
            DeleteMode::Soft => sqlx::query(
                "UPDATE shop.product SET active = FALSE, updated_at = NOW() WHERE product_id = $1",
            )
            .bind(id)
            .execute(self.pool)
            .await?,
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("product {id}")));
        }

        tracing::info!(%mode, "Product deleted");
        Ok(())
    }
}
