//! Customer account repository.

use sqlx::PgPool;
use tracing::instrument;

use stern_core::{CustomerId, Email};

use super::{RepositoryError, conflict_code};
use crate::models::customer::{ContactDetails, CustomerProfile};

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
}

impl TryFrom<CustomerRow> for CustomerProfile {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
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
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    customer: CustomerRow,
    password_hash: Option<String>,
}

const CUSTOMER_COLUMNS: &str = r"
    customer_id, name, email, phone, city, region, country, address, postal_code, active
";

/// Repository for customer accounts.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn get(&self, id: CustomerId) -> Result<CustomerProfile, RepositoryError> {
        sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.customer WHERE customer_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("customer {id}")))?
        .try_into()
    }

    /// Get a customer and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(CustomerProfile, Option<String>)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS}, password_hash FROM shop.customer WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((r.customer.try_into()?, r.password_hash)))
            .transpose()
    }

    /// Create a customer with a password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` (`DUPLICATE`) if the email is taken.
    #[instrument(skip(self, contact, password_hash), fields(email = %email))]
    pub async fn create_with_password(
        &self,
        name: &str,
        email: &Email,
        contact: &ContactDetails,
        password_hash: &str,
    ) -> Result<CustomerProfile, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO shop.customer
                (name, email, phone, city, region, country, address, postal_code, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(name)
        .bind(email)
        .bind(&contact.phone)
        .bind(&contact.city)
        .bind(&contact.region)
        .bind(&contact.country)
        .bind(&contact.address)
        .bind(&contact.postal_code)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::conflict(
                    conflict_code::DUPLICATE,
                    "a customer with this email already exists",
                );
            }
            RepositoryError::Database(e)
        })?;

        tracing::info!(customer_id = row.customer_id, "Customer registered");
        row.try_into()
    }

    /// Insert or update the customer keyed by `email`. `password_hash` is
    /// written only when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, contact, password_hash), fields(email = %email))]
    pub async fn upsert_profile(
        &self,
        name: &str,
        email: &Email,
        contact: &ContactDetails,
        password_hash: Option<&str>,
    ) -> Result<CustomerProfile, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO shop.customer
                (name, email, phone, city, region, country, address, postal_code, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                phone = EXCLUDED.phone,
                city = EXCLUDED.city,
                region = EXCLUDED.region,
                country = EXCLUDED.country,
                address = EXCLUDED.address,
                postal_code = EXCLUDED.postal_code,
                password_hash = COALESCE(EXCLUDED.password_hash, shop.customer.password_hash),
                updated_at = NOW()
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(name)
        .bind(email)
        .bind(&contact.phone)
        .bind(&contact.city)
        .bind(&contact.region)
        .bind(&contact.country)
        .bind(&contact.address)
        .bind(&contact.postal_code)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(customer_id = row.customer_id, "Customer profile saved");
        row.try_into()
    }
}
