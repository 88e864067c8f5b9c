pub mod parser;
pub mod writer;

pub use parser::{read_request, ParseError};
pub use writer::{render_response, write_response};
