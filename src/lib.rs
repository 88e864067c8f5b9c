pub mod config;
pub mod dto;
pub mod http;
pub mod resources;
pub mod server;

pub use dto::{Request, Response, ResponseError};
pub use server::{ResponseHandle, StubServer};
