//! Token cookie parsing and construction

use std::fmt;

/// Bearer token issued by the backend
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token, rejecting blank values
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the token itself
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<{} chars>)", self.0.len())
    }
}

/// Find cookie `name` in a `Cookie` request header value
pub fn token_from_cookie_header(header: &str, name: &str) -> Option<SessionToken> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .and_then(|(_, value)| {
            let value = value.trim().trim_matches('"');
            let decoded = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            SessionToken::new(decoded)
        })
}

/// `Set-Cookie` value storing the token for all paths
pub fn set_cookie(name: &str, token: &SessionToken, http_only: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; SameSite=Lax",
        name,
        urlencoding::encode(token.as_str())
    );
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie
}

/// `Set-Cookie` value that removes the token
pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Max-Age=0; Path=/", name)
}
