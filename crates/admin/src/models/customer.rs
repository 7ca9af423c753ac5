//! Customers as managed from the back-office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stern_core::{CustomerId, Email};

use super::{clean_optional, require_text};

/// A customer row. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
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
    pub signup_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/customers`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

/// Contact fields shared by create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

/// A validated customer ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: Email,
    pub contact: ContactDetails,
}

impl CreateCustomerInput {
    /// Normalize and validate the body.
    ///
    /// # Errors
    ///
    /// Returns a message when the name is blank or the email is malformed.
    pub fn validate(self) -> Result<NewCustomer, String> {
        let name = require_text(&self.name, "name")?;
        let email = Email::parse(&self.email).map_err(|e| e.to_string())?;

        Ok(NewCustomer {
            name,
            email,
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

/// Body of `PATCH /api/customers/{id}`. Absent fields are left unchanged; a
/// blank optional string clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub active: Option<bool>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    /// `Some(None)` clears the column.
    pub phone: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub region: Option<Option<String>>,
    pub country: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub postal_code: Option<Option<String>>,
    pub active: Option<bool>,
}

impl UpdateCustomerInput {
    /// Validate the fields that were supplied.
    ///
    /// # Errors
    ///
    /// Returns a message when a supplied name is blank or a supplied email is
    /// malformed.
    pub fn validate(self) -> Result<CustomerChanges, String> {
        let name = self
            .name
            .as_deref()
            .map(|n| require_text(n, "name"))
            .transpose()?;
        let email = self
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| e.to_string())?;

        Ok(CustomerChanges {
            name,
            email,
            phone: self.phone.map(|v| clean_optional(Some(v))),
            city: self.city.map(|v| clean_optional(Some(v))),
            region: self.region.map(|v| clean_optional(Some(v))),
            country: self.country.map(|v| clean_optional(Some(v))),
            address: self.address.map(|v| clean_optional(Some(v))),
            postal_code: self.postal_code.map(|v| clean_optional(Some(v))),
            active: self.active,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_normalizes() {
        let input: CreateCustomerInput = serde_json::from_str(
            r#"{"name":" Ana ","email":"ANA@Example.com","city":" CDMX ","phone":""}"#,
        )
        .unwrap();
        let customer = input.validate().unwrap();
        assert_eq!(customer.name, "Ana");
        assert_eq!(customer.email.as_str(), "ana@example.com");
        assert_eq!(customer.contact.city.as_deref(), Some("CDMX"));
        assert_eq!(customer.contact.phone, None);
    }

    #[test]
    fn test_create_rejects_bad_email() {
        let input: CreateCustomerInput =
            serde_json::from_str(r#"{"name":"Ana","email":"nope"}"#).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_update_distinguishes_absent_and_cleared() {
        let input: UpdateCustomerInput =
            serde_json::from_str(r#"{"city":"  ","active":false}"#).unwrap();
        let changes = input.validate().unwrap();
        assert_eq!(changes.city, Some(None));
        assert_eq!(changes.region, None);
        assert_eq!(changes.active, Some(false));
    }
}
