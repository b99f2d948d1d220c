//! Read-only access to request attributes needed by authentication and authorisation.
use anyhow::Result;

/// Read request information to discover credentials and route attributes.
pub trait RequestView {
    /// Check if the request accepts HTML responses (it likely comes from a browser).
    fn accepts_html(&self) -> bool {
        match self.header("accept") {
            Ok(Some(accept)) => accept.contains("text/html"),
            _ => false,
        }
    }

    /// Check if a header is present on the request, regardless of its value.
    fn has_header(&self, name: &str) -> bool;

    /// Look for a header value with the given name.
    ///
    /// Returns `None` if the header is missing or an `Err` if the value could
    /// not be decoded.
    fn header(&self, name: &str) -> Result<Option<&str>>;

    /// HTTP method of the request.
    fn method(&self) -> &str;

    /// Path of the request, without query string.
    ///
    /// This is the path requests are routed on, so percent-encoded characters
    /// must already be decoded.
    fn path(&self) -> &str;
}

#[cfg(feature = "actix-web")]
impl RequestView for actix_web::HttpRequest {
    fn has_header(&self, name: &str) -> bool {
        self.headers().contains_key(name)
    }

    fn header(&self, name: &str) -> Result<Option<&str>> {
        match self.headers().get(name) {
            None => Ok(None),
            Some(header) => {
                let value = header.to_str()?;
                Ok(Some(value))
            }
        }
    }

    fn method(&self) -> &str {
        actix_web::HttpRequest::method(self).as_str()
    }

    fn path(&self) -> &str {
        // The router matches the decoded path, not the raw URI one.
        self.match_info().as_str()
    }
}

/// In-memory request to exercise authentication and authorisation logic in tests.
#[cfg(any(test, feature = "test-fixture"))]
#[derive(Clone, Debug)]
pub struct MockRequest {
    headers: Vec<(String, String)>,
    method: String,
    path: String,
}

#[cfg(any(test, feature = "test-fixture"))]
impl MockRequest {
    /// Mock a `GET` request for the given path.
    pub fn get<S: Into<String>>(path: S) -> MockRequest {
        MockRequest {
            headers: Vec::new(),
            method: "GET".into(),
            path: path.into(),
        }
    }

    /// Attach a header to the request.
    pub fn with_header<S1, S2>(mut self, name: S1, value: S2) -> MockRequest
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl RequestView for MockRequest {
    fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(header, _)| header.eq_ignore_ascii_case(name))
    }

    fn header(&self, name: &str) -> Result<Option<&str>> {
        let value = self
            .headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str());
        Ok(value)
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }
}
