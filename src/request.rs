//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use http::Extensions;
use percent_encoding::percent_decode_str;

/// An incoming HTTP request with its body fully read.
///
/// The method is kept exactly as it arrived on the wire. Routing compares it
/// against the registered verbs without any normalisation. The path is
/// percent-decoded once; `/caf%C3%A9` routes as `/café`.
pub struct Request {
    pub(crate) method: String,
    pub(crate) raw_path: String,
    /// `None` when the raw path does not decode to UTF-8. Such requests never match a route.
    pub(crate) path: Option<String>,
    pub(crate) uri: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) extensions: Extensions,
}

impl Request {
    pub fn method(&self) -> &str { &self.method }

    /// Percent-decoded path. Falls back to the raw path when it does not
    /// decode to valid UTF-8.
    pub fn path(&self) -> &str { self.path.as_deref().unwrap_or(&self.raw_path) }

    /// Path exactly as it appeared in the request line (e.g. `/a%20b`).
    pub fn raw_path(&self) -> &str { &self.raw_path }

    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Path plus query string, as the client sent it (e.g. `/search?q=rust`).
    pub fn uri(&self) -> &str { &self.uri }

    /// Address of the connected peer. `None` for requests built in-process.
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// The decoded path, if there is one. This is the routing key.
    pub(crate) fn route_path(&self) -> Option<&str> { self.path.as_deref() }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Typed values attached by middleware (e.g. verified token claims).
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// Sets the peer address. The server calls this for every accepted request.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }
}

/// Builds a [`Request`] from an `http::Request` whose body is already buffered.
///
/// Header values that are not valid UTF-8 are dropped.
///
/// ```rust
/// use bytes::Bytes;
/// use muxa::Request;
///
/// let req: Request = http::Request::builder()
///     .method("POST")
///     .uri("/users?notify=1")
///     .header("content-type", "application/json")
///     .body(Bytes::from_static(b"{}"))
///     .unwrap()
///     .into();
///
/// assert_eq!(req.path(), "/users");
/// assert_eq!(req.uri(), "/users?notify=1");
/// ```
impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();

        let uri = parts.uri.path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());

        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();

        let raw_path = parts.uri.path();
        let path = percent_decode_str(raw_path)
            .decode_utf8()
            .ok()
            .map(|decoded| decoded.into_owned());

        Self {
            method: parts.method.as_str().to_owned(),
            raw_path: raw_path.to_owned(),
            path,
            uri,
            headers,
            body: body.to_vec(),
            remote_addr: None,
            extensions: parts.extensions,
        }
    }
}

#[cfg(test)]
impl Request {
    pub(crate) fn fake(method: &str, uri: &str) -> Self {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .expect("valid test request")
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(uri: &str) -> http::request::Builder {
        http::Request::builder().method("GET").uri(uri)
    }

    #[test]
    fn splits_path_from_query() {
        let req: Request = build("/a/b?x=1&y=2").body(Bytes::new()).unwrap().into();
        assert_eq!(req.method(), "GET");
        assert_eq!(req.path(), "/a/b");
        assert_eq!(req.uri(), "/a/b?x=1&y=2");
        assert!(req.remote_addr().is_none());
    }

    #[test]
    fn path_is_percent_decoded() {
        let req: Request = build("/caf%C3%A9/a%20b?q=%20").body(Bytes::new()).unwrap().into();
        assert_eq!(req.path(), "/café/a b");
        assert_eq!(req.raw_path(), "/caf%C3%A9/a%20b");
        assert_eq!(req.uri(), "/caf%C3%A9/a%20b?q=%20");
        assert_eq!(req.route_path(), Some("/café/a b"));
    }

    #[test]
    fn undecodable_path_has_no_route_key() {
        let req: Request = build("/caf%FF").body(Bytes::new()).unwrap().into();
        assert_eq!(req.route_path(), None);
        assert_eq!(req.path(), "/caf%FF");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req: Request = build("/")
            .header("Authorization", "Bearer abc")
            .body(Bytes::new())
            .unwrap()
            .into();
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn drops_non_utf8_header_values() {
        let value = http::HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap();
        let req: Request = build("/")
            .header("x-binary", value)
            .body(Bytes::new())
            .unwrap()
            .into();
        assert!(req.header("x-binary").is_none());
    }

    #[test]
    fn keeps_body_and_peer() {
        let addr: SocketAddr = "10.0.0.1:4000".parse().unwrap();
        let req = Request::from(build("/").body(Bytes::from_static(b"hello")).unwrap())
            .with_remote_addr(addr);
        assert_eq!(req.body(), b"hello");
        assert_eq!(req.remote_addr(), Some(addr));
    }
}
