//! Authentication service.
//!
//! Customers sign in with email and password. Passwords are hashed with
//! Argon2id and a random salt; the hash never leaves this module and the
//! customer repository.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use stern_core::Email;

use crate::db::RepositoryError;
use crate::db::customers::CustomerRepository;
use crate::models::customer::{CustomerProfile, LoginInput, ProfileInput, RegisterInput};

/// Authentication service.
pub struct AuthService<'a> {
    customers: CustomerRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
        }
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a blank name, a malformed email or
    /// a short password, and `AuthError::AlreadyExists` if the email is taken.
    pub async fn register(&self, input: RegisterInput) -> Result<CustomerProfile, AuthError> {
        let account = input.validate().map_err(AuthError::Validation)?;
        let password_hash = hash_password(&account.password)?;

        self.customers
            .create_with_password(&account.name, &account.email, &account.contact, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict { .. } => AuthError::AlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email or password is
    /// wrong or the customer never set a password, and
    /// `AuthError::InactiveAccount` for a deactivated customer.
    pub async fn login(&self, input: &LoginInput) -> Result<CustomerProfile, AuthError> {
        let email = Email::parse(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let (customer, password_hash) = self
            .customers
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let password_hash = password_hash.ok_or(AuthError::InvalidCredentials)?;

        verify_password(&input.password, &password_hash)?;

        if !customer.active {
            return Err(AuthError::InactiveAccount);
        }

        Ok(customer)
    }

    /// Save the profile of the customer identified by `email`, rehashing the
    /// password when a new one is given.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a blank name or short password.
    pub async fn update_profile(
        &self,
        email: &Email,
        input: ProfileInput,
    ) -> Result<CustomerProfile, AuthError> {
        let update = input.validate().map_err(AuthError::Validation)?;
        let password_hash = update.password.as_deref().map(hash_password).transpose()?;

        let profile = self
            .customers
            .upsert_profile(&update.name, email, &update.contact, password_hash.as_deref())
            .await?;
        Ok(profile)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("secreto1").unwrap_or_default();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secreto1", &hash).is_ok());
        assert!(matches!(
            verify_password("otro", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("secreto1").unwrap_or_default();
        let b = hash_password("secreto1").unwrap_or_default();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("secreto1", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
