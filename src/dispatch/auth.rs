//! Caller authentication.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Authenticated user/session pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Caller {
    pub user: String,
    pub session: String,
}

/// Credential verifier consulted by the dispatcher.
///
/// `None` always means "not authenticated"; implementations must not leak
/// why verification failed.
pub trait Authenticator: Send + Sync {
    /// Verify a bearer token from the `Auth-Token` header.
    fn verify_token(&self, token: &str) -> Option<Caller>;

    /// Verify the session cookie from a raw `Cookie` header.
    fn verify_session_cookie(&self, cookie_header: Option<&str>) -> Option<Caller>;
}

/// Authenticator backed by a fixed token table.
///
/// Session cookies carry the same tokens under a configurable cookie name.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    tokens: HashMap<String, Caller>,
    cookie_name: String,
}

impl StaticAuthenticator {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            tokens: HashMap::new(),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let mut auth = Self::new(config.cookie_name.clone());
        for entry in &config.tokens {
            auth = auth.with_token(&entry.token, &entry.user, &entry.session);
        }
        auth
    }

    pub fn with_token(mut self, token: &str, user: &str, session: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            Caller {
                user: user.to_string(),
                session: session.to_string(),
            },
        );
        self
    }
}

impl Authenticator for StaticAuthenticator {
    fn verify_token(&self, token: &str) -> Option<Caller> {
        if token.is_empty() {
            return None;
        }
        self.tokens.get(token).cloned()
    }

    fn verify_session_cookie(&self, cookie_header: Option<&str>) -> Option<Caller> {
        let token = cookie_value(cookie_header?, &self.cookie_name)?;
        self.verify_token(token)
    }
}

/// Find a cookie by name in a `Cookie` header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}
