//! Per-request response accumulator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::response::cookie::Cookie;

pub const DEFAULT_STATUS: u16 = 200;

/// Mutable response state built up by application code.
///
/// Every field stays `None` until [`build`] fills in its default, so an
/// untouched state is distinguishable from one explicitly set to the default.
/// Header names are stored lower-cased, so differently cased writes of one
/// header replace each other.
///
/// [`build`]: ResponseState::build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseState {
    status: Option<u16>,
    headers: Option<BTreeMap<String, String>>,
    cookies: Option<BTreeMap<String, Cookie>>,
    body: Option<Vec<u8>>,
}

/// A response with every default applied, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, Cookie>,
    pub body: Vec<u8>,
}

impl ResponseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with only the body set.
    pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
        let mut state = Self::new();
        state.set_body(body);
        state
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn set_status(&mut self, code: u16) -> &mut Self {
        self.status = Some(code);
        self
    }

    pub fn set_cookie(&mut self, key: impl Into<String>, cookie: Cookie) -> &mut Self {
        self.cookies
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), cookie);
        self
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Header value, looked up case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        self.headers.as_ref()
    }

    pub fn cookie(&self, key: &str) -> Option<&Cookie> {
        self.cookies.as_ref()?.get(key)
    }

    pub fn cookies(&self) -> Option<&BTreeMap<String, Cookie>> {
        self.cookies.as_ref()
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Body as UTF-8 text, if set and valid.
    pub fn body_str(&self) -> Option<&str> {
        self.body().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Fill every unset field with its default. Set fields are left alone,
    /// so calling this more than once changes nothing.
    pub fn build(&mut self) -> &mut Self {
        self.status.get_or_insert(DEFAULT_STATUS);
        self.headers.get_or_insert_with(BTreeMap::new);
        self.cookies.get_or_insert_with(BTreeMap::new);
        self.body.get_or_insert_with(Vec::new);
        self
    }

    /// Apply defaults and hand out the finished response.
    pub fn into_built(mut self) -> BuiltResponse {
        self.build();
        BuiltResponse {
            status: self.status.unwrap_or(DEFAULT_STATUS),
            headers: self.headers.unwrap_or_default(),
            cookies: self.cookies.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
        }
    }
}
