use base64::{engine::general_purpose, Engine};
use std::fmt;

/// Basic or bearer authentication in http or websocket transport.
///
/// Use to inject username and password or an auth token into requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authorization {
    /// HTTP basic auth.
    Basic(String),
    /// HTTP bearer auth.
    Bearer(String),
}

impl Authorization {
    /// Instantiate a new basic auth from a username and password.
    pub fn basic(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let username = username.as_ref();
        let password = password.as_ref();
        let auth_secret = general_purpose::STANDARD.encode(format!("{username}:{password}"));
        Self::Basic(auth_secret)
    }

    /// Instantiate a new bearer auth with the given token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(auth_secret) => write!(f, "Basic {auth_secret}"),
            Self::Bearer(token) => write!(f, "Bearer {token}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic_auth_encodes() {
        let auth = Authorization::basic("alice", "s3cret");
        assert_eq!(auth.to_string(), "Basic YWxpY2U6czNjcmV0");
    }
}
