//! Proxy request handling.
//!
//! A proxy receives absolute-form targets (`GET http://host:port/path HTTP/1.0`) for plain
//! HTTP and authority-form targets (`CONNECT host:port HTTP/1.0`) for tunnels. This module
//! splits the request line, classifies it and extracts the origin [`Target`].

use std::fmt;

use bytes::Bytes;
use http::Method;

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize};

const HTTP_SCHEME: &str = "http://";
const DEFAULT_HTTP_PORT: u16 = 80;
const DEFAULT_TUNNEL_PORT: u16 = 443;

/// Where a request has to be forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
    /// Path and query forwarded to the origin, may be empty
    path: String,
}

impl Target {
    pub fn new<H: Into<String>, P: Into<String>>(host: H, port: u16, path: P) -> Self {
        Self { host: host.into(), port, path: path.into() }
    }

    /// Parses an absolute `http://` url.
    ///
    /// The patterns are tried in order and the first one matching wins:
    ///
    /// 1. `host:port/path`
    /// 2. `host/path`, port 80
    /// 3. `host:port`, empty path
    /// 4. `host`, port 80, empty path
    ///
    /// In the patterns carrying a port the host stops at the first `:` or `/`.
    pub fn parse_http(url: &str) -> Result<Self, ParseError> {
        let rest = strip_prefix_ignore_ascii_case(url, HTTP_SCHEME)
            .ok_or_else(|| ParseError::malformed_request(format!("target {url} is not an http url")))?;

        let host_end = rest.find([':', '/']).unwrap_or(rest.len());
        if host_end > 0 && rest[host_end..].starts_with(':') {
            let after_colon = &rest[host_end + 1..];
            let digits_end = after_colon.find(|c: char| !c.is_ascii_digit()).unwrap_or(after_colon.len());
            if digits_end > 0 {
                let port = parse_port(&after_colon[..digits_end])?;
                return Ok(Self::new(&rest[..host_end], port, &after_colon[digits_end..]));
            }
        }

        let host_end = rest.find('/').unwrap_or(rest.len());
        ensure!(host_end > 0, ParseError::malformed_request(format!("target {url} has no host")));
        Ok(Self::new(&rest[..host_end], DEFAULT_HTTP_PORT, &rest[host_end..]))
    }

    /// Parses the `host[:port]` target of a CONNECT request, the port defaults to 443.
    pub fn parse_authority(authority: &str) -> Result<Self, ParseError> {
        match authority.split_once(':') {
            Some((host, port)) => {
                ensure!(!host.is_empty(), ParseError::malformed_request(format!("authority {authority} has no host")));
                Ok(Self::new(host, parse_port(port)?, ""))
            }
            None => Ok(Self::new(authority, DEFAULT_TUNNEL_PORT, "")),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn parse_port(port: &str) -> Result<u16, ParseError> {
    port.parse::<u16>().map_err(|e| ParseError::malformed_request(format!("invalid port {port}: {e}")))
}

fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Whether a request is relayed as framed HTTP or as an opaque tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Http,
    Tunnel,
}

/// The first line of a proxy request, split and classified.
#[derive(Debug, Clone)]
pub struct RequestLine {
    method: Method,
    uri: String,
    protocol: String,
    target: Target,
    kind: RequestKind,
}

impl RequestLine {
    /// Parses `METHOD TARGET PROTOCOL`.
    ///
    /// Exactly three whitespace separated tokens are accepted. The protocol token is kept
    /// as-is and never validated.
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        let line = std::str::from_utf8(line).map_err(ParseError::malformed_request)?;

        let mut tokens = line.split_ascii_whitespace();
        let (Some(method), Some(uri), Some(protocol), None) = (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ParseError::malformed_request(format!("request line `{line}` is not `METHOD TARGET PROTOCOL`")));
        };
        ensure!(!uri.is_empty(), ParseError::malformed_request("empty request target"));

        let method = Method::from_bytes(method.as_bytes()).map_err(ParseError::malformed_request)?;

        let (target, kind) = if strip_prefix_ignore_ascii_case(uri, HTTP_SCHEME).is_some() {
            (Target::parse_http(uri)?, RequestKind::Http)
        } else if method.as_str() == "CONNECT" {
            (Target::parse_authority(uri)?, RequestKind::Tunnel)
        } else {
            return Err(ParseError::malformed_request(format!("unsupported target {uri} for method {method}")));
        };

        Ok(Self { method, uri: uri.to_string(), protocol: protocol.to_string(), target, kind })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn is_tunnel(&self) -> bool {
        self.kind == RequestKind::Tunnel
    }
}

/// A fully parsed proxy request head.
///
/// The header block holds the raw header lines in arrival order, each with its original
/// terminator, and never includes the blank line that ended the head.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    line: RequestLine,
    headers: Bytes,
    payload_size: PayloadSize,
}

impl ProxyRequest {
    pub fn new(line: RequestLine, headers: Bytes, payload_size: PayloadSize) -> Self {
        Self { line, headers, payload_size }
    }

    /// The method, with the case it was received in.
    pub fn method(&self) -> &Method {
        &self.line.method
    }

    /// The request target exactly as the client sent it.
    pub fn uri(&self) -> &str {
        &self.line.uri
    }

    pub fn protocol(&self) -> &str {
        &self.line.protocol
    }

    pub fn target(&self) -> &Target {
        &self.line.target
    }

    pub fn kind(&self) -> RequestKind {
        self.line.kind
    }

    pub fn is_tunnel(&self) -> bool {
        self.line.is_tunnel()
    }

    /// HEAD responses never carry a body, the method is compared case-insensitively.
    pub fn is_head(&self) -> bool {
        self.method().as_str().eq_ignore_ascii_case(Method::HEAD.as_str())
    }

    pub fn headers(&self) -> &Bytes {
        &self.headers
    }

    /// Framing of the request body that follows the head.
    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }
}

impl fmt::Display for ProxyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.line.method, self.line.uri)
    }
}
