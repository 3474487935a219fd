//! Request and response descriptors.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use authfetch_core::Result;
use authfetch_core::error::{Error, InvalidInputError, ProtocolError};

/// An outgoing request.
///
/// `url` is either a path resolved against the configured base URL or an
/// absolute URL. The client mutates `headers` in place before sending and
/// again when it replays the request after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is not a valid HTTP header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| InvalidInputError::HeaderValue {
                name: name.to_string(),
            })?;
        let value = header_value(&header_name, value)?;
        self.headers.insert(header_name, value);
        Ok(self)
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| InvalidInputError::Other {
            message: format!("cannot serialize request body: {}", e),
        })?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// The current `Authorization` header, if set and valid UTF-8.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Set the `Authorization` header to a bearer value, marked sensitive so
    /// it never shows up in Debug output.
    pub(crate) fn set_authorization(&mut self, bearer: &str) -> Result<()> {
        let mut value = header_value(&AUTHORIZATION, bearer)?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// A completed response, carrying the request that produced it.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub request: ApiRequest,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            Error::InvalidInput(InvalidInputError::Other {
                message: format!("cannot decode response body: {}", e),
            })
        })
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn this response into a protocol error for the caller.
    pub fn into_error(self) -> Error {
        Error::Protocol(ProtocolError::new(self.status, self.text()))
    }
}

pub(crate) fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        Error::InvalidInput(InvalidInputError::HeaderValue {
            name: name.to_string(),
        })
    })
}
