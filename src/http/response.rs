//! Response sink written by handlers.
//!
//! # Responsibilities
//! - Buffer status, headers and body for one request
//! - Provide the standard response helpers (empty, text, HTML, JSON, 500)
//! - Enforce that the response is closed exactly once
//!
//! # Design Decisions
//! - Body is buffered; the transport writes it after dispatch completes
//! - Closing is crate-private, only the request lifecycle finalizes

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use serde::Serialize;
use thiserror::Error;

use crate::module::HandlerError;

/// Errors raised by the response sink.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response already closed")]
    AlreadyClosed,
}

/// Mutable response for one exchange.
#[derive(Debug)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    closes: u32,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            closes: 0,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossy.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Append raw bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    fn set_content_type(&mut self, value: &'static str) {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
    }

    /// Status only, empty body.
    pub fn standard_response_without_body(&mut self, status: StatusCode) {
        self.status = status;
        self.body.clear();
        self.headers.remove(header::CONTENT_TYPE);
    }

    /// 200 with a plain-text body.
    pub fn string_response(&mut self, text: impl AsRef<str>) {
        self.status = StatusCode::OK;
        self.set_content_type("text/plain; charset=utf-8");
        self.body = text.as_ref().as_bytes().to_vec();
    }

    /// Status with an HTML body fragment wrapped in a minimal page.
    pub fn html_response(&mut self, status: StatusCode, fragment: &str) {
        let title = status.canonical_reason().unwrap_or("Response");
        let page = format!(
            "<html><head><meta charset=\"utf-8\"><title>{code} - {title}</title></head>\
             <body><h1>{code} - {title}</h1>{fragment}</body></html>",
            code = status.as_u16(),
        );

        self.status = status;
        self.set_content_type("text/html; charset=utf-8");
        self.body = page.into_bytes();
    }

    /// Status with a JSON body.
    pub fn json_response<T: Serialize>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), HandlerError> {
        let body = serde_json::to_vec(value)?;
        self.status = status;
        self.set_content_type("application/json");
        self.body = body;
        Ok(())
    }

    /// Default 500 page: the fault message and its trace.
    pub fn server_error_response(&mut self, err: &HandlerError) {
        let fragment = format!(
            "<h2>Message</h2><pre>{}</pre><h2>Stack Trace</h2><pre>\r\n{}</pre>",
            escape_html(&err.to_string()),
            escape_html(&err.trace()),
        );
        self.html_response(StatusCode::INTERNAL_SERVER_ERROR, &fragment);
    }

    /// Finalize the response. Succeeds once, then reports `AlreadyClosed`.
    pub(crate) fn close(&mut self) -> Result<(), ResponseError> {
        if self.closes > 0 {
            return Err(ResponseError::AlreadyClosed);
        }
        self.closes += 1;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closes > 0
    }

    /// Number of successful closes: 0 while dispatching, 1 afterwards.
    pub fn close_count(&self) -> u32 {
        self.closes
    }

    /// Convert into a response the transport can send.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
