//! Catalog reads with caching.
//!
//! Category and featured listings are the same for every visitor and are
//! cached with `moka` for the configured TTL. Filtered listings, product
//! detail and search go straight to [`CatalogRepository`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::product::{CatalogProduct, Category};

/// Cache key for shared catalog listings.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Featured,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Products(Arc<Vec<CatalogProduct>>),
}

/// Catalog reads shared across handlers. Cheap to clone.
#[derive(Clone)]
pub struct CatalogService {
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    /// Create a catalog service whose listings live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();
        Self { cache }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self, pool: &PgPool) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(CatalogRepository::new(pool).categories().await?);
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// The featured shelf.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(
        &self,
        pool: &PgPool,
    ) -> Result<Arc<Vec<CatalogProduct>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::Featured).await {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let products = Arc::new(CatalogRepository::new(pool).featured().await?);
        self.cache
            .insert(CacheKey::Featured, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// Drop every cached listing.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cached_categories_are_served_without_database() {
        let service = CatalogService::new(Duration::from_secs(60));
        let cached = Arc::new(vec![Category {
            category_id: stern_core::CategoryId::new(1),
            name: "Ropa".into(),
        }]);
        service
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&cached)),
            )
            .await;

        // A lazy pool never connects unless a query runs.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/stern_unused")
            .unwrap_or_else(|e| panic!("{e}"));
        let categories = service.categories(&pool).await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(categories, cached);

        service.invalidate_all().await;
        assert!(service.cache.get(&CacheKey::Categories).await.is_none());
    }
}
