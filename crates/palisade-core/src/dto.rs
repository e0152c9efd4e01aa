//! Boundary DTOs.
//!
//! Inbound payloads are validated with `validate()` before they reach a
//! service; violations name the wire field through a static constant, so
//! no runtime type introspection is involved. Outbound DTOs mirror the
//! entities but carry no credential material.

pub mod company;
pub mod permission;
pub mod role;
pub mod user;

use crate::error::{PalisadeError, PalisadeResult};

pub(crate) fn required(value: &str, field: &'static str) -> PalisadeResult<()> {
    if value.trim().is_empty() {
        return Err(PalisadeError::Validation {
            field,
            message: "is required".into(),
        });
    }
    Ok(())
}

pub(crate) fn max_len(value: &str, max: usize, field: &'static str) -> PalisadeResult<()> {
    if value.chars().count() > max {
        return Err(PalisadeError::Validation {
            field,
            message: format!("must be at most {max} characters"),
        });
    }
    Ok(())
}

pub(crate) fn min_len(value: &str, min: usize, field: &'static str) -> PalisadeResult<()> {
    if value.chars().count() < min {
        return Err(PalisadeError::Validation {
            field,
            message: format!("must be at least {min} characters"),
        });
    }
    Ok(())
}

pub(crate) fn email_format(value: &str, field: &'static str) -> PalisadeResult<()> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && domain.contains('.')
        }
        None => false,
    };
    if !valid {
        return Err(PalisadeError::Validation {
            field,
            message: "must be a valid email address".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        assert!(required("  ", "name").is_err());
        assert!(required("x", "name").is_ok());
    }

    #[test]
    fn email_format_needs_local_and_domain() {
        assert!(email_format("a@b.com", "email").is_ok());
        assert!(email_format("a@b", "email").is_err());
        assert!(email_format("@b.com", "email").is_err());
        assert!(email_format("nope", "email").is_err());
    }

    #[test]
    fn violations_name_the_wire_field() {
        let err = max_len("xxxxx", 3, "tax_id").unwrap_err();
        match err {
            PalisadeError::Validation { field, .. } => assert_eq!(field, "tax_id"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
