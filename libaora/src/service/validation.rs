//! Input validation performed before any gateway call
//!
//! Form and query checks live here so the gateway is never contacted with
//! input the backend would reject for being empty.

use secrecy::{ExposeSecret, SecretString};

use crate::error::GatewayError;

const REQUIRED_DETAILS: &str = "please fill in the required details.";
const EMPTY_SEARCH: &str = "Please input something to search across db.";

/// Sign-up form as entered by the user
#[derive(Debug)]
pub struct SignUpForm {
    pub user_name: String,
    pub email: String,
    pub password: SecretString,
}

/// Sign-in form as entered by the user
#[derive(Debug)]
pub struct SignInForm {
    pub email: String,
    pub password: SecretString,
}

fn missing_fields(fields: &[(&'static str, bool)]) -> Result<(), GatewayError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::Validation(format!(
            "{} Missing: {}",
            REQUIRED_DETAILS,
            missing.join(", ")
        )))
    }
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Every sign-up field must be non-blank
pub fn validate_sign_up(form: &SignUpForm) -> Result<(), GatewayError> {
    missing_fields(&[
        ("user name", present(&form.user_name)),
        ("email", present(&form.email)),
        ("password", present(form.password.expose_secret())),
    ])
}

/// Email and password must be non-blank
pub fn validate_sign_in(form: &SignInForm) -> Result<(), GatewayError> {
    missing_fields(&[
        ("email", present(&form.email)),
        ("password", present(form.password.expose_secret())),
    ])
}

/// Reject blank search queries; returns the trimmed query
pub fn validate_search_query(query: &str) -> Result<String, GatewayError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::Validation(EMPTY_SEARCH.to_string()));
    }
    Ok(trimmed.to_string())
}
