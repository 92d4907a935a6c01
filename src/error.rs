use thiserror::Error;

use crate::api::Response;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while talking to the API.
///
/// Server-reported failures keep the complete [`Response`] envelope around so
/// callers can inspect the raw exchange when the code and description alone
/// are not enough.
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP transport could not be set up at construction time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A request was attempted with a method the API does not accept.
    /// Raised before any network activity happens.
    #[error("unsupported request method: {0}")]
    UnsupportedMethod(String),

    /// The request never produced an HTTP response (DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered, but with a non-200 status or an error payload.
    #[error("API error [{code}]: {description}")]
    Api {
        code: String,
        description: String,
        response: Option<Response>,
    },

    /// The token endpoint returned 200 with a body we could not decode.
    #[error("token acquisition failed")]
    TokenAcquisition { response: Response },
}

impl Error {
    /// Wire-level error code, matching what the server uses where it has one.
    pub fn code(&self) -> &str {
        match self {
            Error::Configuration(_) => "configuration_error",
            Error::UnsupportedMethod(_) => "no_support_method",
            Error::Transport(_) => "transport_error",
            Error::Api { code, .. } => code,
            Error::TokenAcquisition { .. } => "token_acquisition_failed",
        }
    }

    /// Human-readable description of the failure.
    pub fn description(&self) -> &str {
        match self {
            Error::Configuration(message) => message,
            Error::UnsupportedMethod(method) => method,
            Error::Transport(message) => message,
            Error::Api { description, .. } => description,
            Error::TokenAcquisition { .. } => "token response body is not valid JSON",
        }
    }

    /// The captured exchange behind a server-reported failure, if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Api { response, .. } => response.as_ref(),
            Error::TokenAcquisition { response } => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_are_stable() {
        assert_eq!(Error::Transport("timed out".to_string()).code(), "transport_error");
        assert_eq!(Error::UnsupportedMethod("PUT".to_string()).code(), "no_support_method");
        assert_eq!(Error::Configuration("no client".to_string()).code(), "configuration_error");

        let api = Error::Api {
            code: "invalid_token".to_string(),
            description: "token expired".to_string(),
            response: None,
        };
        assert_eq!(api.code(), "invalid_token");
        assert_eq!(api.description(), "token expired");
        assert!(api.response().is_none());
    }

    #[test]
    fn display_includes_code_and_description() {
        let api = Error::Api {
            code: "access_denied".to_string(),
            description: "no grants".to_string(),
            response: None,
        };
        assert_eq!(api.to_string(), "API error [access_denied]: no grants");
    }
}
