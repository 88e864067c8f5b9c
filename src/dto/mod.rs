pub mod request;
pub mod response;

pub use request::Request;
pub use response::{Response, ResponseError};
