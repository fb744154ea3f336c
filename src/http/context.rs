//! Request context for one HTTP exchange.
//!
//! # Responsibilities
//! - Expose request data (remote endpoint, verb, path, query, headers, body)
//! - Carry the path parameters of the route being invoked
//! - Own the response sink for the lifetime of the dispatch
//!
//! # Design Decisions
//! - Built by the transport, moved into the dispatcher, handed back closed
//! - Body is buffered before dispatch; handlers never touch the socket

use std::net::{Ipv4Addr, SocketAddr};
use std::time::SystemTime;

use axum::body::Bytes;
use percent_encoding::percent_decode_str;
use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method, Uri};

use crate::http::request_id::RequestId;
use crate::http::response::ResponseSink;
use crate::routing::params::PathParams;
use crate::routing::verb::Verb;

/// Everything a handler can see and write for one request.
#[derive(Debug)]
pub struct HttpContext {
    remote_addr: SocketAddr,
    method: Method,
    verb: Option<Verb>,
    uri: Uri,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    params: PathParams,
    request_id: RequestId,
    response: ResponseSink,
}

impl HttpContext {
    /// A context with no headers and an empty body.
    pub fn new(method: Method, uri: Uri, remote_addr: SocketAddr) -> Self {
        let verb = Verb::from_method(&method);
        let path = percent_decode_str(uri.path()).decode_utf8_lossy().into_owned();
        Self {
            remote_addr,
            method,
            verb,
            uri,
            path,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: PathParams::new(),
            request_id: RequestId::derive(SystemTime::now(), remote_addr),
            response: ResponseSink::new(),
        }
    }

    /// Build from request parts already buffered by the transport.
    pub fn from_parts(parts: Parts, remote_addr: SocketAddr, body: Bytes) -> Self {
        let mut ctx = Self::new(parts.method, parts.uri, remote_addr);
        ctx.headers = parts.headers;
        ctx.body = body;
        ctx
    }

    /// Shorthand used by tests and embedders: method token and path-and-query.
    ///
    /// Unknown method tokens are kept as extension methods; an unparsable
    /// URI falls back to `/`.
    pub fn for_request(method: &str, uri: &str) -> Self {
        let method = Method::from_bytes(method.as_bytes()).unwrap_or(Method::GET);
        let uri = uri.parse().unwrap_or_else(|_| Uri::from_static("/"));
        Self::new(method, uri, SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Parsed verb; `None` for methods outside the known set.
    pub fn verb(&self) -> Option<Verb> {
        self.verb
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Percent-decoded request path; this is what routes match against.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path exactly as received, still percent-encoded.
    pub fn raw_path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parameters captured by the route currently being invoked.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn response(&self) -> &ResponseSink {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseSink {
        &mut self.response
    }

    pub fn into_response_sink(self) -> ResponseSink {
        self.response
    }
}
