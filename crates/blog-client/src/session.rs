use std::fmt;

/// Identity of the viewer, passed explicitly into every remote call.
///
/// Nothing in this crate stores a session; callers hand in the current one
/// each time so a logout or account switch takes effect on the next call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
    token: Option<String>,
}

impl Session {
    /// A viewer without credentials. Reads may still succeed.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            token: Some(token.into()),
        }
    }

    pub fn from_parts(username: Option<String>, token: Option<String>) -> Self {
        Self { username, token }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
