//! Database operations for customers.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use stern_core::{CustomerId, DeleteMode, Email};

use super::{RepositoryError, map_delete_error, map_unique_error};
use crate::models::customer::{Customer, CustomerChanges, NewCustomer};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    customer_id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    address: Option<String>,
    postal_code: Option<String>,
    active: bool,
    signup_date: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "customer {} has invalid email: {e}",
                row.customer_id
            ))
        })?;

        Ok(Self {
            customer_id: CustomerId::new(row.customer_id),
            name: row.name,
            email,
            phone: row.phone,
            city: row.city,
            region: row.region,
            country: row.country,
            address: row.address,
            postal_code: row.postal_code,
            active: row.active,
            signup_date: row.signup_date,
            updated_at: row.updated_at,
        })
    }
}

const CUSTOMER_COLUMNS: &str = "customer_id, name, email, phone, city, region, country, \
     address, postal_code, active, signup_date, updated_at";

const DUPLICATE_EMAIL: &str = "a customer with this email already exists";

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List customers, most recent sign-ups first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.customer ORDER BY signup_date DESC, customer_id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Customer::try_from).collect()
    }

    /// Create a customer without a password (staff-entered).
    ///
    /// # Errors
    ///
    /// Returns a `DUPLICATE` conflict if the email is already registered.
    #[instrument(skip(self, customer), fields(email = %customer.email))]
    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError> {
        let contact = &customer.contact;
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO shop.customer
                (name, email, phone, city, region, country, address, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(&customer.name)
        .bind(customer.email.as_str())
        .bind(&contact.phone)
        .bind(&contact.city)
        .bind(&contact.region)
        .bind(&contact.country)
        .bind(&contact.address)
        .bind(&contact.postal_code)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_error(e, DUPLICATE_EMAIL))?;

        tracing::info!(customer_id = row.customer_id, "Customer created");
        row.try_into()
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no customer has this id, or a
    /// `DUPLICATE` conflict if the new email is taken.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: CustomerId,
        changes: CustomerChanges,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            UPDATE shop.customer SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = CASE WHEN $4 THEN $5 ELSE phone END,
                city = CASE WHEN $6 THEN $7 ELSE city END,
                region = CASE WHEN $8 THEN $9 ELSE region END,
                country = CASE WHEN $10 THEN $11 ELSE country END,
                address = CASE WHEN $12 THEN $13 ELSE address END,
                postal_code = CASE WHEN $14 THEN $15 ELSE postal_code END,
                active = COALESCE($16, active),
                updated_at = NOW()
            WHERE customer_id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(changes.phone.is_some())
        .bind(changes.phone.flatten())
        .bind(changes.city.is_some())
        .bind(changes.city.flatten())
        .bind(changes.region.is_some())
        .bind(changes.region.flatten())
        .bind(changes.country.is_some())
        .bind(changes.country.flatten())
        .bind(changes.address.is_some())
        .bind(changes.address.flatten())
        .bind(changes.postal_code.is_some())
        .bind(changes.postal_code.flatten())
        .bind(changes.active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_error(e, DUPLICATE_EMAIL))?
        .ok_or_else(|| RepositoryError::NotFound(format!("customer {id}")))?;

        row.try_into()
    }

    /// Delete or deactivate a customer.
    ///
    /// A hard delete of a customer with orders fails with an `FK_CONSTRAINT`
    /// conflict; the caller may then ask for a soft delete explicitly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no customer has this id, or
    /// `RepositoryError::Conflict` if a hard delete is blocked.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId, mode: DeleteMode) -> Result<(), RepositoryError> {
        let result = match mode {
            DeleteMode::Hard => sqlx::query("DELETE FROM shop.customer WHERE customer_id = $1")
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| map_delete_error(e, "customer"))?,
            DeleteMode::Soft => sqlx::query(
                "UPDATE shop.customer SET active = FALSE, updated_at = NOW() WHERE customer_id = $1",
            )
            .bind(id)
            .execute(self.pool)
            .await?,
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("customer {id}")));
        }

        tracing::info!(%mode, "Customer deleted");
        Ok(())
    }
}
