//! Authentication collaborator for the CREDENTIALS exchange.

use cassette_core::error::{CqlError, Result};

/// Produces the CREDENTIALS payload when the server asks for it.
///
/// The server's AUTHENTICATE response names an authenticator class; the
/// implementation returns the key/value pairs that class expects. The
/// engine sends them verbatim as a `[string map]`.
pub trait Authenticator {
    /// Builds credentials for the named server-side authenticator.
    fn credentials(&self, authenticator_class: &str) -> Result<Vec<(String, String)>>;
}

/// Default collaborator for clusters without authentication.
///
/// Fails the handshake if the server requests credentials.
#[derive(Debug, Default)]
pub struct NoAuthentication;

impl Authenticator for NoAuthentication {
    fn credentials(&self, authenticator_class: &str) -> Result<Vec<(String, String)>> {
        Err(CqlError::BadCredentials(format!(
            "server requires {} but no authenticator is configured",
            authenticator_class
        )))
    }
}

/// A fixed credential map, regardless of the authenticator class.
///
/// Covers the stock `PasswordAuthenticator` exchange; anything richer
/// (SASL round trips, tokens) is a caller-provided implementation.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    pairs: Vec<(String, String)>,
}

impl StaticCredentials {
    /// Creates username/password credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            pairs: vec![
                ("username".to_string(), username.into()),
                ("password".to_string(), password.into()),
            ],
        }
    }

    /// Creates credentials from arbitrary key/value pairs.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl Authenticator for StaticCredentials {
    fn credentials(&self, _authenticator_class: &str) -> Result<Vec<(String, String)>> {
        Ok(self.pairs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_authentication_refuses() {
        let auth = NoAuthentication;
        assert!(matches!(
            auth.credentials("org.apache.cassandra.auth.PasswordAuthenticator"),
            Err(CqlError::BadCredentials(_))
        ));
    }

    #[test]
    fn static_credentials_ignore_class() {
        let auth = StaticCredentials::new("cassandra", "cassandra");
        let pairs = auth.credentials("AnyAuthenticator").unwrap();
        assert_eq!(pairs[0], ("username".to_string(), "cassandra".to_string()));
        assert_eq!(pairs[1], ("password".to_string(), "cassandra".to_string()));
    }
}
