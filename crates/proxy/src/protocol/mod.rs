//! Core proxy protocol types.
//!
//! This module holds the values that flow between the codecs, the relay engines and the
//! connection supervisor.
//!
//! # Architecture
//!
//! - **Message Handling** ([`message`]): head/payload framing shared by every codec
//!   - [`Message`]: either a head part or a payload item
//!   - [`PayloadItem`]: a payload chunk or EOF
//!   - [`PayloadSize`]: how much payload follows a head
//!
//! - **Lines** ([`line`]): a raw line and how it was terminated
//!
//! - **Requests** ([`request`]): the parsed proxy request
//!   - [`ProxyRequest`]: method, target, protocol token and raw header block
//!   - [`Target`]: origin host, port and path
//!
//! - **Responses** ([`response`]): origin head lines and the fixed responses of the proxy
//!
//! - **Error Handling** ([`error`]): one error type per failure class
//!   - [`ProxyError`]: top-level error of a connection
//!   - [`ParseError`]: the request head could not be parsed
//!   - [`OriginError`]: the origin could not be reached
//!   - [`TransferError`]: relaying failed midway

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod line;
pub use line::Line;
pub use line::Terminator;

mod request;
pub use request::ProxyRequest;
pub use request::RequestKind;
pub use request::RequestLine;
pub use request::Target;

mod response;
pub use response::parse_status;
pub use response::ResponseHeadLine;
pub use response::{BAD_REQUEST, CONNECTION_CLOSE, CONNECTION_ESTABLISHED};

mod error;
pub use error::IdleElapsed;
pub use error::OriginError;
pub use error::ParseError;
pub use error::ProxyError;
pub use error::TransferError;
