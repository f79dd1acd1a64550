use std::fmt;

/// Bearer credential shared by every API call.
/// The token is issued elsewhere; this client never refreshes it.
#[derive(Clone)]
pub struct AuthContext {
    token: String,
}

impl AuthContext {
    pub fn new(token: impl Into<String>) -> Self {
        AuthContext { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// Keep the token out of logs
impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext").field("token", &"***").finish()
    }
}
