//! Failure taxonomy for outbound requests.
//!
//! DESIGN
//! ======
//! Every failed call resolves to exactly one `TransportError` variant, and
//! the variant's `Display` string is the user-facing notification text. The
//! server's optional `message` body field is retained on the variants where
//! the caller may want inline text (a login form) in addition to the global
//! notification.

/// Classified outcome of a failed transport call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// HTTP 401 — the presented token was invalid or expired.
    #[error("authentication failed, please log in again")]
    CredentialRejected { server_message: Option<String> },

    /// HTTP 403 — authenticated but not allowed.
    #[error("insufficient permissions")]
    AuthorizationDenied { server_message: Option<String> },

    /// HTTP 404.
    #[error("requested resource does not exist")]
    ResourceNotFound,

    /// HTTP 500.
    #[error("server error")]
    ServerFault,

    /// Any other HTTP error status; carries the server's message when the
    /// body provided one.
    #[error("{}", server_message.as_deref().unwrap_or("request failed"))]
    RequestRejected {
        status: u16,
        server_message: Option<String>,
    },

    /// The request was dispatched but no response arrived (connect failure,
    /// timeout).
    #[error("network connection failed")]
    NetworkUnavailable,

    /// The request could not be built, so it was never dispatched.
    #[error("request configuration error")]
    ConfigurationError,
}

impl TransportError {
    /// Map a non-success HTTP status (plus the optional `message` field from
    /// the response body) to its variant.
    #[must_use]
    pub fn classify_status(status: u16, server_message: Option<String>) -> Self {
        match status {
            401 => Self::CredentialRejected { server_message },
            403 => Self::AuthorizationDenied { server_message },
            404 => Self::ResourceNotFound,
            500 => Self::ServerFault,
            _ => Self::RequestRejected { status, server_message },
        }
    }

    /// Map a `reqwest` send failure. Builder errors never left the process;
    /// everything else is a network-class failure.
    #[must_use]
    pub fn classify_send_failure(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            Self::ConfigurationError
        } else {
            Self::NetworkUnavailable
        }
    }

    /// The server-provided message, when the response body carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::CredentialRejected { server_message }
            | Self::AuthorizationDenied { server_message }
            | Self::RequestRejected { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }
}

/// Login rejection surfaced as a result value rather than an error channel,
/// so the login form can render the message inline.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct LoginError {
    pub message: String,
}

impl LoginError {
    /// Build from a classified transport failure, preferring the server's
    /// own message over the generic text.
    #[must_use]
    pub fn from_transport(err: &TransportError) -> Self {
        Self {
            message: err
                .server_message()
                .unwrap_or("login failed")
                .to_owned(),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
