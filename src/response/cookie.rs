//! Response cookies.

use serde::{Deserialize, Serialize};

/// A cookie to be set on the HTTP response.
///
/// Defaults mirror the usual `setcookie` defaults: no expiry, path `/`,
/// no domain, neither secure nor http-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub value: String,
    /// Unix expiry time; `0` makes it a session cookie.
    pub expire: i64,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expire: 0,
            path: "/".to_string(),
            domain: String::new(),
            secure: false,
            http_only: false,
        }
    }

    pub fn expire(mut self, expire: i64) -> Self {
        self.expire = expire;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Render as a `Set-Cookie` header value. The value is form-urlencoded so
    /// it cannot end the pair or add attributes.
    pub fn to_header_value(&self, name: &str) -> String {
        let value: String = url::form_urlencoded::byte_serialize(self.value.as_bytes()).collect();
        let mut out = format!("{name}={value}");
        if self.expire > 0 {
            out.push_str(&format!("; Max-Age={}", self.max_age(now_unix())));
        }
        if !self.path.is_empty() {
            out.push_str(&format!("; Path={}", self.path));
        }
        if !self.domain.is_empty() {
            out.push_str(&format!("; Domain={}", self.domain));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }

    fn max_age(&self, now: i64) -> i64 {
        (self.expire - now).max(0)
    }
}

impl Default for Cookie {
    fn default() -> Self {
        Self::new("")
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cookie = Cookie::new("v");
        assert_eq!(cookie.expire, 0);
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.domain, "");
        assert!(!cookie.secure && !cookie.http_only);
    }

    #[test]
    fn header_rendering() {
        let cookie = Cookie::new("abc").domain("example.com").secure(true).http_only(true);
        assert_eq!(
            cookie.to_header_value("sid"),
            "sid=abc; Path=/; Domain=example.com; Secure; HttpOnly"
        );
        assert_eq!(Cookie::new("x").path("").to_header_value("k"), "k=x");
    }

    #[test]
    fn value_cannot_inject_attributes() {
        let cookie = Cookie::new("a; Domain=evil.example");
        assert_eq!(
            cookie.to_header_value("sid"),
            "sid=a%3B+Domain%3Devil.example; Path=/"
        );
        assert_eq!(Cookie::new("x=1 y").path("").to_header_value("k"), "k=x%3D1+y");
    }

    #[test]
    fn expired_cookie_gets_zero_max_age() {
        assert_eq!(Cookie::new("x").expire(100).max_age(1_000), 0);
        assert_eq!(Cookie::new("x").expire(1_060).max_age(1_000), 60);
    }
}
