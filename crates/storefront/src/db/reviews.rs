//! Product review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use stern_core::{CustomerId, ProductId, ReviewId};

use super::RepositoryError;
use crate::models::review::{NewReview, Review};

/// Shown for reviews whose author record has no name.
const ANONYMOUS: &str = "Cliente";

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    review_id: i64,
    rating: i16,
    comment: Option<String>,
    customer_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            review_id: ReviewId::new(row.review_id),
            rating: row.rating,
            comment: row.comment,
            customer_name: row
                .customer_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_owned()),
            created_at: row.created_at,
        }
    }
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.review_id, r.rating, r.comment, c.name AS customer_name, r.created_at
            FROM shop.review r
            LEFT JOIN shop.customer c ON c.customer_id = r.customer_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.review_id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Publish a review of an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or inactive.
    #[instrument(skip(self, review), fields(product_id = %product_id, customer_id = %customer_id))]
    pub async fn create(
        &self,
        product_id: ProductId,
        customer_id: CustomerId,
        review: &NewReview,
    ) -> Result<ReviewId, RepositoryError> {
        let id: Option<i64> = sqlx::query_scalar(
            r"
            INSERT INTO shop.review (product_id, customer_id, rating, comment)
            SELECT product_id, $2, $3, $4
            FROM shop.product
            WHERE product_id = $1 AND active
            RETURNING review_id
            ",
        )
        .bind(product_id)
        .bind(customer_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_optional(self.pool)
        .await?;

        let id = id.ok_or_else(|| RepositoryError::NotFound(format!("product {product_id}")))?;
        tracing::info!(review_id = id, rating = review.rating, "Review published");
        Ok(ReviewId::new(id))
    }
}
