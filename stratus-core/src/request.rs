//! Request descriptor and cache key types.
//!
//! This module provides the two request-shaped types the engine works with:
//!
//! - [`RequestDescriptor`] - an immutable view of an intercepted request
//! - [`CacheKey`] - the normalized storage key derived from a request URL
//!
//! ## Key Normalization
//!
//! Cache keys are the request URL normalized to
//! `{scheme}://{authority}{path}?{query}`. The query string is part of the
//! key; the fragment never is. Two requests that differ only in fragment map
//! to the same key.
//!
//! ```
//! use stratus_core::RequestDescriptor;
//!
//! let a = RequestDescriptor::get("https://app.example/api/health?v=1".parse().unwrap());
//! let b = RequestDescriptor::get("https://app.example/api/health?v=2".parse().unwrap());
//! assert_ne!(a.cache_key(), b.cache_key());
//! ```

use http::header::ACCEPT;
use http::{HeaderMap, Method, Uri};
use smol_str::SmolStr;
use std::fmt;

/// An immutable view of an intercepted request.
///
/// Carries the method, the absolute request URI, and the header subset the
/// routing rules consult (notably `accept`). Descriptors are cheap to clone
/// and never mutated after construction.
///
/// # Example
///
/// ```
/// use http::Method;
/// use stratus_core::RequestDescriptor;
///
/// let request = RequestDescriptor::get("https://app.example/app.css".parse().unwrap());
/// assert_eq!(request.method(), &Method::GET);
/// assert_eq!(request.path(), "/app.css");
/// assert_eq!(request.origin().as_deref(), Some("https://app.example"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl RequestDescriptor {
    /// Creates a descriptor from method, absolute URI, and headers.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Creates a GET descriptor with no headers.
    pub fn get(uri: Uri) -> Self {
        Self::new(Method::GET, uri, HeaderMap::new())
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the URI path component.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request origin as `{scheme}://{authority}`, or `None` for
    /// relative URIs.
    pub fn origin(&self) -> Option<String> {
        let scheme = self.uri.scheme_str()?;
        let authority = self.uri.authority()?;
        Some(format!("{scheme}://{authority}"))
    }

    /// Returns the host component of the URI, without the port.
    pub fn host(&self) -> Option<&str> {
        self.uri.host()
    }

    /// Returns the `accept` header value, if present and valid UTF-8.
    pub fn accept(&self) -> Option<&str> {
        self.headers.get(ACCEPT).and_then(|v| v.to_str().ok())
    }

    /// Whether the `accept` header indicates an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.accept().is_some_and(|accept| accept.contains("text/html"))
    }

    /// Whether this is a navigation (top-level document) request: the root
    /// path, an `.html` path, or an `accept` header asking for HTML.
    pub fn is_navigation(&self) -> bool {
        self.path() == "/" || self.path().ends_with(".html") || self.accepts_html()
    }

    /// Returns the normalized cache key for this request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_uri(&self.uri)
    }
}

/// A normalized cache key identifying a stored entry within a partition.
///
/// Keys are the request URL reduced to scheme, authority, path, and query.
/// Fragments are excluded by construction. `CacheKey` is small, hashable, and
/// cheap to clone.
///
/// # Example
///
/// ```
/// use stratus_core::CacheKey;
///
/// let key = CacheKey::from_uri(&"https://app.example/api/health?probe=1".parse().unwrap());
/// assert_eq!(key.as_str(), "https://app.example/api/health?probe=1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Builds a key from an absolute URI, dropping everything but scheme,
    /// authority, path, and query.
    pub fn from_uri(uri: &Uri) -> Self {
        let scheme = uri.scheme_str().unwrap_or("http");
        let authority = uri.authority().map(|a| a.as_str()).unwrap_or_default();
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        CacheKey(SmolStr::new(format!("{scheme}://{authority}{path_and_query}")))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
