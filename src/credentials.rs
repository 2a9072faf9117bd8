use crate::constants::AUTH_USER;
use crate::error::{CompressionError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

/// An API key for the compression service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Basic auth token: base64 of `api:<key>`.
    pub fn auth_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", AUTH_USER, self.0))
    }

    /// Short form safe to print in logs.
    pub fn masked(&self) -> String {
        let visible: String = self.0.chars().take(4).collect();
        format!("{}****", visible)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.masked())
    }
}

/// Ordered list of API keys with a cursor that only moves forward.
///
/// Once the cursor passes the last key the rotor stays exhausted for the rest
/// of the process.
#[derive(Debug)]
pub struct CredentialRotor {
    credentials: Vec<Credential>,
    cursor: usize,
}

impl CredentialRotor {
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            credentials: secrets.into_iter().map(Credential::new).collect(),
            cursor: 0,
        }
    }

    pub fn current(&self) -> Result<&Credential> {
        self.credentials
            .get(self.cursor)
            .ok_or(CompressionError::CredentialsExhausted)
    }

    /// Moves to the next key. Returns whether one remains.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.credentials.len() {
            self.cursor += 1;
        }
        !self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.credentials.len()
    }

    /// 1-based position of the active key, for log lines.
    pub fn position(&self) -> usize {
        self.cursor + 1
    }
}
