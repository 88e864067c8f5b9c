use crate::http::parser::ParseError;
use indexmap::IndexMap;

pub const CONTENT_LENGTH: &str = "Content-Length";

// One request as observed on the wire. Header names keep the case the client sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query_params: IndexMap<String, String>,
    pub(crate) headers: IndexMap<String, String>,
    pub(crate) body: String,
}

impl Request {
    pub fn method(&self) -> &String {
        &self.method
    }

    pub fn path(&self) -> &String {
        &self.path
    }

    pub fn query_params(&self) -> &IndexMap<String, String> {
        &self.query_params
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &String {
        &self.body
    }

    /// Case-sensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Declared body length, `0` when the client sent no `Content-Length`.
    pub fn content_length(&self) -> Result<usize, ParseError> {
        match self.headers.get(CONTENT_LENGTH) {
            None => Ok(0),
            Some(value) => value
                .parse()
                .map_err(|_| ParseError::InvalidContentLength(value.clone())),
        }
    }
}
