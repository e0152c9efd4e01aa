//! Company DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::{max_len, required};
use crate::error::PalisadeResult;
use crate::models::company::{Company, CompanyAddress, CompanyContact};

/// Inbound payload for company create and full-replace update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompanyDto {
    pub name: String,
    pub legal_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tax_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub email: Option<String>,
    pub address: CreateCompanyAddressDto,
    pub contacts: Vec<CreateCompanyContactDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompanyAddressDto {
    pub street: String,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub street_complement: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompanyContactDto {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

impl CreateCompanyDto {
    pub fn validate(&self) -> PalisadeResult<()> {
        required(&self.name, "name")?;
        max_len(&self.name, 255, "name")?;
        required(&self.legal_name, "legal_name")?;
        max_len(&self.legal_name, 255, "legal_name")?;
        if let Some(description) = &self.description {
            max_len(description, 4000, "description")?;
        }
        required(&self.tax_id, "tax_id")?;
        max_len(&self.tax_id, 14, "tax_id")?;
        if let Some(email) = &self.email {
            max_len(email, 150, "email")?;
        }
        self.address.validate()?;
        if self.contacts.is_empty() {
            return Err(crate::error::PalisadeError::Validation {
                field: "contacts",
                message: "at least one contact is required".into(),
            });
        }
        for contact in &self.contacts {
            contact.validate()?;
        }
        Ok(())
    }
}

impl CreateCompanyAddressDto {
    fn validate(&self) -> PalisadeResult<()> {
        required(&self.street, "address.street")?;
        max_len(&self.street, 255, "address.street")?;
        required(&self.city, "address.city")?;
        max_len(&self.city, 100, "address.city")?;
        required(&self.state, "address.state")?;
        max_len(&self.state, 100, "address.state")?;
        required(&self.postal_code, "address.postal_code")?;
        max_len(&self.postal_code, 20, "address.postal_code")?;
        required(&self.country, "address.country")?;
        max_len(&self.country, 100, "address.country")?;
        Ok(())
    }
}

impl CreateCompanyContactDto {
    fn validate(&self) -> PalisadeResult<()> {
        required(&self.name, "contacts.name")?;
        max_len(&self.name, 255, "contacts.name")?;
        if let Some(email) = &self.email {
            max_len(email, 150, "contacts.email")?;
        }
        if let Some(phone) = &self.phone {
            max_len(phone, 20, "contacts.phone")?;
        }
        if let Some(tax_id) = &self.tax_id {
            max_len(tax_id, 40, "contacts.tax_id")?;
        }
        Ok(())
    }
}

/// Outbound company representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDto {
    pub id: Uuid,
    pub name: String,
    pub legal_name: String,
    pub description: Option<String>,
    pub tax_id: String,
    pub enabled: bool,
    pub email: Option<String>,
    pub address: Option<CompanyAddressDto>,
    pub contacts: Vec<CompanyContactDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAddressDto {
    pub id: Uuid,
    pub street: String,
    pub street_number: Option<String>,
    pub street_complement: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyContactDto {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
}

impl From<Company> for CompanyDto {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            legal_name: company.legal_name,
            description: company.description,
            tax_id: company.tax_id,
            enabled: company.enabled,
            email: company.email,
            address: company.address.map(CompanyAddressDto::from),
            contacts: company
                .contacts
                .into_iter()
                .map(CompanyContactDto::from)
                .collect(),
            created_at: company.created_at,
            updated_at: company.updated_at,
            deleted_at: company.deleted_at,
        }
    }
}

impl From<CompanyAddress> for CompanyAddressDto {
    fn from(address: CompanyAddress) -> Self {
        Self {
            id: address.id,
            street: address.street,
            street_number: address.street_number,
            street_complement: address.street_complement,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

impl From<CompanyContact> for CompanyContactDto {
    fn from(contact: CompanyContact) -> Self {
        Self {
            id: contact.id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            tax_id: contact.tax_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CreateCompanyDto {
        CreateCompanyDto {
            name: "Acme".into(),
            legal_name: "Acme Holdings Ltd".into(),
            description: None,
            tax_id: "12345678000190".into(),
            enabled: true,
            email: Some("ops@acme.example".into()),
            address: CreateCompanyAddressDto {
                street: "Main St".into(),
                street_number: Some("42".into()),
                street_complement: None,
                city: "Springfield".into(),
                state: "IL".into(),
                postal_code: "62701".into(),
                country: "US".into(),
            },
            contacts: vec![CreateCompanyContactDto {
                name: "Jo".into(),
                email: None,
                phone: None,
                tax_id: None,
            }],
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn tax_id_length_is_capped() {
        let mut dto = valid();
        dto.tax_id = "123456789012345".into();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn at_least_one_contact_is_required() {
        let mut dto = valid();
        dto.contacts.clear();
        assert!(dto.validate().is_err());
    }
}
