//! Error types for Aora

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AoraError>;

/// Prefix the backend SDKs put in front of every error message.
const BACKEND_ERROR_PREFIX: &str = "AppwriteException:";

#[derive(Error, Debug)]
pub enum AoraError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AoraError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AoraError::InvalidInput(_) => 3,
            AoraError::Gateway(GatewayError::Validation(_)) => 3,
            AoraError::Gateway(e) if e.is_auth() => 2,
            AoraError::Gateway(_) => 1,
            AoraError::Config(_) => 1,
        }
    }

    /// Message suitable for a user-visible alert.
    ///
    /// Gateway errors are reported without the category prefix, the way the
    /// backend phrased them.
    pub fn user_message(&self) -> String {
        match self {
            AoraError::Gateway(e) => e.message(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// A required field was empty; raised before the backend is contacted
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl GatewayError {
    /// True for the authentication family (bad credentials, duplicate account)
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidCredentials(_) | GatewayError::DuplicateAccount(_)
        )
    }

    /// The bare, normalized message carried by this error
    pub fn message(&self) -> String {
        match self {
            GatewayError::Validation(m)
            | GatewayError::InvalidCredentials(m)
            | GatewayError::DuplicateAccount(m)
            | GatewayError::Network(m)
            | GatewayError::NotFound(m) => m.clone(),
            GatewayError::Decode(e) => e.to_string(),
        }
    }
}

/// Failure to map a backend document onto a typed entity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{entity} document is missing required field '{field}'")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} field '{field}' has wrong type (expected {expected})")]
    InvalidType {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{entity} field '{field}' is not a valid URL: {value}")]
    InvalidUrl {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{entity} document is not a JSON object")]
    NotAnObject { entity: &'static str },
}

/// Strip the backend SDK prefix from an error message
///
/// Only the leading prefix is removed; surrounding whitespace is trimmed.
pub fn normalize_message(message: &str) -> String {
    let trimmed = message.trim();
    trimmed
        .strip_prefix(BACKEND_ERROR_PREFIX)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = AoraError::InvalidInput("Empty query".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_validation_error() {
        let error = AoraError::Gateway(GatewayError::Validation("email".to_string()));
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_auth_family() {
        let invalid = AoraError::Gateway(GatewayError::InvalidCredentials("bad".to_string()));
        let duplicate = AoraError::Gateway(GatewayError::DuplicateAccount("taken".to_string()));
        assert_eq!(invalid.exit_code(), 2);
        assert_eq!(duplicate.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_network_and_not_found() {
        let network = AoraError::Gateway(GatewayError::Network("timeout".to_string()));
        let missing = AoraError::Gateway(GatewayError::NotFound("user".to_string()));
        assert_eq!(network.exit_code(), 1);
        assert_eq!(missing.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_config_error() {
        let error = AoraError::Config(ConfigError::MissingField("gateway.project_id".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting() {
        let error = AoraError::Gateway(GatewayError::Network("Connection refused".to_string()));
        assert_eq!(
            error.to_string(),
            "Gateway error: Network error: Connection refused"
        );
    }

    #[test]
    fn test_user_message_drops_category() {
        let error = AoraError::Gateway(GatewayError::Network("Network timeout".to_string()));
        assert_eq!(error.user_message(), "Network timeout");

        let error = AoraError::InvalidInput("Search query cannot be empty".to_string());
        assert_eq!(error.user_message(), "Invalid input: Search query cannot be empty");
    }

    #[test]
    fn test_decode_error_inside_gateway_error() {
        let decode = DecodeError::MissingField {
            entity: "video",
            field: "title",
        };
        let error: GatewayError = decode.into();
        assert!(error
            .message()
            .contains("video document is missing required field 'title'"));
    }

    #[test]
    fn test_normalize_message_strips_prefix() {
        assert_eq!(
            normalize_message("AppwriteException: Invalid credentials"),
            "Invalid credentials"
        );
        assert_eq!(normalize_message("  plain message "), "plain message");
    }

    #[test]
    fn test_normalize_message_keeps_inner_occurrence() {
        assert_eq!(
            normalize_message("Failed: AppwriteException: x"),
            "Failed: AppwriteException: x"
        );
    }

    #[test]
    fn test_error_conversion_from_config_error() {
        let config_error = ConfigError::MissingField("test".to_string());
        let aora_error: AoraError = config_error.into();

        match aora_error {
            AoraError::Config(_) => {}
            _ => panic!("Expected AoraError::Config"),
        }
    }
}
