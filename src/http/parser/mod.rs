pub mod primitives;
pub mod request;

pub use request::{parse_request_line, parse_target, read_request, RequestLine};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("invalid request target: {0:?}")]
    InvalidTarget(String),

    #[error("invalid content length: {0:?}")]
    InvalidContentLength(String),

    #[error("failed to read request: {0}")]
    Io(#[from] std::io::Error),
}
