use crate::{ApiError, FailureKind};

/// Supplies the bearer token for each request.
///
/// Tokens are looked up per request and never cached on disk; a session
/// mechanism can implement this to hand out short-lived tokens.
pub trait TokenProvider: Send + Sync {
    fn bearer(&self) -> Result<String, ApiError>;
}

/// Reads the token from an environment variable at request time.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub const DEFAULT_VAR: &'static str = "CRAWL_DASH_TOKEN";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl TokenProvider for EnvTokenProvider {
    fn bearer(&self) -> Result<String, ApiError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ApiError::new(
                FailureKind::MissingCredential,
                format!("No token found (set {})", self.var),
            )),
        }
    }
}

/// Fixed token handed over by the caller.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn bearer(&self) -> Result<String, ApiError> {
        if self.0.trim().is_empty() {
            return Err(ApiError::new(FailureKind::MissingCredential, "No token found"));
        }
        Ok(self.0.clone())
    }
}
