use std::io;
use thiserror::Error;

/// Top level error of one proxied connection.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("origin error: {source}")]
    OriginError {
        #[from]
        source: OriginError,
    },

    #[error("transfer error: {source}")]
    TransferError {
        #[from]
        source: TransferError,
    },
}

/// The idle deadline of a connection passed while it waited in `stage`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("idle timeout elapsed while {stage}")]
pub struct IdleElapsed {
    pub stage: &'static str,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed request: {reason}")]
    MalformedRequest { reason: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error(transparent)]
    TimedOut(#[from] IdleElapsed),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_request<S: ToString>(str: S) -> Self {
        Self::MalformedRequest { reason: str.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Whether the client deserves a `400 BAD REQUEST` for this error.
    ///
    /// Only recognizable parse failures qualify, io failures and timeouts close silently.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::MalformedRequest { .. } | Self::TooLargeHeader { .. } | Self::InvalidContentLength { .. })
    }
}

impl From<ParseError> for io::Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Io { source } => source,
            ParseError::TimedOut(elapsed) => io::Error::new(io::ErrorKind::TimedOut, elapsed),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// The origin server could not be reached.
#[derive(Error, Debug)]
pub enum OriginError {
    #[error("lookup {host} failed: {source}")]
    Lookup { host: String, source: io::Error },

    #[error("lookup {host} returned no usable address")]
    NoAddress { host: String },

    #[error("connect {host}:{port} failed: {source}")]
    Connect { host: String, port: u16, source: io::Error },

    #[error(transparent)]
    TimedOut(#[from] IdleElapsed),
}

impl OriginError {
    pub fn lookup<S: ToString>(host: S, source: io::Error) -> Self {
        Self::Lookup { host: host.to_string(), source }
    }

    pub fn no_address<S: ToString>(host: S) -> Self {
        Self::NoAddress { host: host.to_string() }
    }

    pub fn connect<S: ToString>(host: S, port: u16, source: io::Error) -> Self {
        Self::Connect { host: host.to_string(), port, source }
    }
}

/// Reading or writing failed while relaying between client and origin.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("client io error: {source}")]
    Client { source: io::Error },

    #[error("origin io error: {source}")]
    Origin { source: io::Error },

    #[error("origin closed before the response head was complete")]
    IncompleteResponseHead,

    #[error(transparent)]
    TimedOut(#[from] IdleElapsed),
}

impl TransferError {
    pub fn client<E: Into<io::Error>>(e: E) -> Self {
        Self::Client { source: e.into() }
    }

    pub fn origin<E: Into<io::Error>>(e: E) -> Self {
        Self::Origin { source: e.into() }
    }
}
