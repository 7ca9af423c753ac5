//! Read-only catalog queries. Only active products are ever returned.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use stern_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::product::{CatalogProduct, Category};

/// Number of products on the featured shelf.
pub const FEATURED_LIMIT: i64 = 8;

/// Largest page `list_products` will return.
pub const MAX_LIST_LIMIT: i64 = 200;

/// Number of hits returned by a search.
pub const SEARCH_LIMIT: i64 = 8;

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
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for CatalogProduct {
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
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    category_id: i64,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            category_id: CategoryId::new(row.category_id),
            name: row.name,
        }
    }
}

const PRODUCT_COLUMNS: &str = r"
    product_id, name, category, brand, description, price, discount_percent,
    stock, image_url, created_at
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products, newest first, optionally restricted to one category
    /// (matched case-insensitively by name).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product
            WHERE active
              AND ($1::text IS NULL OR LOWER(category) = LOWER($1))
            ORDER BY created_at DESC, product_id DESC
            LIMIT $2
            "
        ))
        .bind(category)
        .bind(limit.clamp(1, MAX_LIST_LIMIT))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CatalogProduct::from).collect())
    }

    /// The newest active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self) -> Result<Vec<CatalogProduct>, RepositoryError> {
        self.list_products(None, FEATURED_LIMIT).await
    }

    /// One active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or inactive.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<CatalogProduct, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE product_id = $1 AND active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(CatalogProduct::from)
        .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))
    }

    /// Active products whose name or category contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(term));
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product
            WHERE active AND (name ILIKE $1 OR category ILIKE $1)
            ORDER BY created_at DESC, product_id DESC
            LIMIT $2
            "
        ))
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CatalogProduct::from).collect())
    }

    /// All categories by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT category_id, name FROM shop.category ORDER BY category_id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("gorra"), "gorra");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
