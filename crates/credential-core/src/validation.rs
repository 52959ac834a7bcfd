//! Input validation for registration and login

use validator::{Validate, ValidationErrors};

use crate::{Error, LoginRequest, RegisterRequest, Result};

/// Validated registration request
#[derive(Debug, Validate)]
pub struct ValidatedRegisterRequest {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "email is not valid"), length(max = 254))]
    pub email: String,

    #[validate(length(max = 128, message = "password must be at most 128 characters"))]
    pub password: String,
}

/// Validated login request
#[derive(Debug, Validate)]
pub struct ValidatedLoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Validates a registration request; the minimum password length comes from
/// configuration.
pub fn validate_register(request: &RegisterRequest, min_password_length: usize) -> Result<()> {
    let validated = ValidatedRegisterRequest {
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        password: request.password.clone(),
    };
    validated.validate().map_err(to_error)?;

    if request.password.chars().count() < min_password_length {
        return Err(Error::Validation(format!(
            "password must be at least {} characters",
            min_password_length
        )));
    }

    Ok(())
}

/// Only shape is checked here; anything wrong beyond that is reported as
/// invalid credentials by the login itself.
pub fn validate_login(request: &LoginRequest) -> Result<()> {
    ValidatedLoginRequest {
        email: request.email.trim().to_string(),
        password: request.password.clone(),
    }
    .validate()
    .map_err(to_error)
}

fn to_error(errors: ValidationErrors) -> Error {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    Error::Validation(messages.join("; "))
}
