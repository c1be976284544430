//! Per-invocation session context
//!
//! Every inbound event builds one of these at invocation start. It is handed
//! to the backend on warm-up, so no identity or token lives in process-wide
//! state between invocations.

use secrecy::SecretString;

/// Who an invocation acts for
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Voice-assistant user id (conversational requests)
    pub identity: Option<String>,

    /// Account-linking bearer token (smart home directives)
    pub bearer_token: Option<SecretString>,

    /// Host request id, for log correlation
    pub request_id: Option<String>,
}

impl SessionContext {
    /// Context for a conversational request made by `identity`
    #[must_use]
    pub fn for_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: Some(identity.into()),
            ..Self::default()
        }
    }

    /// Context for a device directive carrying a bearer token
    #[must_use]
    pub fn for_bearer_token(token: Option<&str>) -> Self {
        Self {
            bearer_token: token.map(|t| SecretString::from(t.to_string())),
            ..Self::default()
        }
    }

    /// Attach the host request id
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}
