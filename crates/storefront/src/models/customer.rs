//! Customer accounts.

use serde::{Deserialize, Serialize};

use stern_core::{CustomerId, Email};

use super::{clean_optional, require_text};

/// Minimum password length for customer accounts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A customer's profile. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub active: bool,
}

/// Optional contact fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

/// Body of `POST /api/account/register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

/// Body of `PUT /api/account/profile`. A blank password keeps the old one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    #[serde(default)]
    pub name: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A validated registration, password still in clear text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub contact: ContactDetails,
}

/// A validated profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub password: Option<String>,
    pub contact: ContactDetails,
}

impl RegisterInput {
    /// Normalize and validate the body.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<NewAccount, String> {
        let name = require_text(&self.name, "name")?;
        let email = Email::parse(&self.email).map_err(|e| e.to_string())?;
        check_password(&self.password)?;

        Ok(NewAccount {
            name,
            email,
            password: self.password,
            contact: ContactDetails {
                phone: clean_optional(self.phone),
                city: clean_optional(self.city),
                region: clean_optional(self.region),
                country: clean_optional(self.country),
                address: clean_optional(self.address),
                postal_code: clean_optional(self.postal_code),
            },
        })
    }
}

impl ProfileInput {
    /// Normalize and validate the body.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<ProfileUpdate, String> {
        let name = require_text(&self.name, "name")?;
        let password = self.password.filter(|p| !p.trim().is_empty());
        if let Some(password) = password.as_deref() {
            check_password(password)?;
        }

        Ok(ProfileUpdate {
            name,
            password,
            contact: ContactDetails {
                phone: clean_optional(self.phone),
                city: clean_optional(self.city),
                region: clean_optional(self.region),
                country: clean_optional(self.country),
                address: clean_optional(self.address),
                postal_code: clean_optional(self.postal_code),
            },
        })
    }
}

fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password: &str) -> RegisterInput {
        RegisterInput {
            name: " Ana López ".into(),
            email: "Ana@Example.com".into(),
            password: password.into(),
            phone: Some("  ".into()),
            city: Some(" Puebla ".into()),
            region: None,
            country: None,
            address: None,
            postal_code: None,
        }
    }

    #[test]
    fn test_register_normalizes_fields() {
        let account = register("secreto1").validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(account.name, "Ana López");
        assert_eq!(account.email.as_str(), "ana@example.com");
        assert_eq!(account.contact.phone, None);
        assert_eq!(account.contact.city.as_deref(), Some("Puebla"));
    }

    #[test]
    fn test_register_rejects_short_password() {
        assert_eq!(
            register("12345").validate(),
            Err("password must be at least 6 characters".to_owned())
        );
    }

    #[test]
    fn test_profile_blank_password_is_kept() {
        let update = ProfileInput {
            name: "Ana".into(),
            password: Some("   ".into()),
            phone: None,
            city: None,
            region: None,
            country: None,
            address: None,
            postal_code: None,
        }
        .validate()
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(update.password, None);
    }
}
