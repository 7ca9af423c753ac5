//! Database operations for categories.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use stern_core::CategoryId;

use super::{RepositoryError, conflict_code, map_unique_error};
use crate::models::category::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    category_id: i64,
    name: String,
    product_count: i64,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            category_id: CategoryId::new(row.category_id),
            name: row.name,
            product_count: row.product_count,
            created_at: row.created_at,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List categories in creation order with their product usage counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT c.category_id, c.name, c.created_at,
                   (SELECT COUNT(*) FROM shop.product p WHERE p.category = c.name) AS product_count
            FROM shop.category c
            ORDER BY c.category_id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category (name)
            VALUES ($1)
            RETURNING category_id, name, created_at,
                      (SELECT COUNT(*) FROM shop.product p WHERE p.category = $1) AS product_count
            ",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_error(e, "a category with this name already exists"))?;

        Ok(row.into())
    }

    /// Delete a category that no product uses.
    ///
    /// Products reference categories by name, so usage is a count of products
    /// whose `category` equals the category name. The category row is locked
    /// while counting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist, or
    /// a `CATEGORY_IN_USE` conflict if any product still uses it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let name: String = sqlx::query_scalar(
            "SELECT name FROM shop.category WHERE category_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("category {id}")))?;

        let in_use: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.product WHERE category = $1")
                .bind(&name)
                .fetch_one(&mut *tx)
                .await?;

        if in_use > 0 {
            return Err(RepositoryError::conflict(
                conflict_code::CATEGORY_IN_USE,
                format!("category \"{name}\" is used by {in_use} product(s)"),
            ));
        }

        sqlx::query("DELETE FROM shop.category WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(category = %name, "Category deleted");
        Ok(())
    }
}
