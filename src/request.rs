//! Incoming request type.

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};
use http_body_util::BodyExt;
use hyper::body::Body;

use crate::error::Error;

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    inner: http::Request<Bytes>,
}

impl Request {
    pub fn new(inner: http::Request<Bytes>) -> Self {
        Self { inner }
    }

    /// Buffers the body of `req`.
    ///
    /// Fails with [`Error::Body`] if the body stream yields an error.
    pub async fn from_http<B>(req: http::Request<B>) -> Result<Self, Error>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let body = body.collect().await.map_err(|e| Error::Body(e.into()))?.to_bytes();
        Ok(Self::new(http::Request::from_parts(parts, body)))
    }

    pub fn method(&self) -> &Method { self.inner.method() }
    pub fn uri(&self) -> &Uri { self.inner.uri() }
    pub fn path(&self) -> &str { self.inner.uri().path() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn body(&self) -> &Bytes { self.inner.body() }

    /// Header lookup. Names are case-insensitive; values that are not
    /// visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Request-scoped values attached by outer middleware.
    pub fn extensions(&self) -> &Extensions { self.inner.extensions() }
    pub fn extensions_mut(&mut self) -> &mut Extensions { self.inner.extensions_mut() }

    pub fn into_inner(self) -> http::Request<Bytes> {
        self.inner
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(inner: http::Request<Bytes>) -> Self {
        Self::new(inner)
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::Full;

    use super::*;

    #[tokio::test]
    async fn buffers_body_and_keeps_parts() {
        let req = http::Request::builder()
            .method(Method::POST)
            .uri("/users?page=2")
            .header("X-Request-Id", "abc")
            .body(Full::new(Bytes::from_static(b"{\"name\":\"alice\"}")))
            .unwrap();

        let req = Request::from_http(req).await.unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users");
        assert_eq!(req.uri().query(), Some("page=2"));
        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("missing"), None);
        assert_eq!(req.body().as_ref(), b"{\"name\":\"alice\"}");
    }
}
