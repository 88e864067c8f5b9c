use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use thiserror::Error;

pub const LAST_MODIFIED: &str = "Last-Modified";
pub const LOCATION: &str = "Location";

const DEFAULT_STATUS_CODE: u16 = 200;
const DEFAULT_MIME_TYPE: &str = "text/plain";
const DEFAULT_BODY: &str = "n/a";

const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];
const LAST_MODIFIED_FORMAT: &str = "%A, %d %b %Y %H:%M:%S GMT";

/// A programmed reply. Only the header map can change after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub(crate) status_code: u16,
    pub(crate) mime_type: String,
    pub(crate) body: String,
    pub(crate) headers: IndexMap<String, String>,
}

impl Default for Response {
    fn default() -> Self {
        Response {
            status_code: DEFAULT_STATUS_CODE,
            mime_type: String::from(DEFAULT_MIME_TYPE),
            body: String::from(DEFAULT_BODY),
            headers: IndexMap::new(),
        }
    }
}

impl Response {
    pub fn new(mime_type: impl Into<String>, body: impl Into<String>) -> Self {
        Response {
            mime_type: mime_type.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_status(
        status_code: u16,
        mime_type: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Response {
            status_code,
            ..Response::new(mime_type, body)
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn mime_type(&self) -> &String {
        &self.mime_type
    }

    pub fn body(&self) -> &String {
        &self.body
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn set_last_modified(&mut self, last_modified: impl Into<DateTime<Utc>>) -> &mut Self {
        let formatted = last_modified.into().format(LAST_MODIFIED_FORMAT).to_string();
        self.add_header(LAST_MODIFIED, formatted)
    }

    /// Fails unless the status code is a redirect, so set the status first.
    pub fn set_location(&mut self, location: impl Into<String>) -> Result<&mut Self, ResponseError> {
        if !REDIRECT_CODES.contains(&self.status_code) {
            return Err(ResponseError::LocationRequiresRedirect {
                status_code: self.status_code,
            });
        }
        Ok(self.add_header(LOCATION, location))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResponseError {
    #[error("Setting the location header is only meaningful for status codes 301, 302, 303, 307, and 308")]
    LocationRequiresRedirect { status_code: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_defaults() {
        let response = Response::default();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.mime_type(), "text/plain");
        assert_eq!(response.body(), "n/a");
        assert!(response.headers().is_empty());

        let response = Response::new("application/json", "[1,2,3]");
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.mime_type(), "application/json");

        let response = Response::with_status(404, "application/json", "[1,2,3]");
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.body(), "[1,2,3]");
    }

    #[test]
    fn test_headers_keep_insertion_order() {
        let mut response = Response::default();
        response
            .add_header("B", "1")
            .add_header("A", "2")
            .add_header("B", "3");

        let headers: Vec<(&str, &str)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(headers, vec![("B", "3"), ("A", "2")]);
    }

    #[test]
    fn test_last_modified() {
        let mut response = Response::default();
        response.set_last_modified(UNIX_EPOCH + Duration::from_secs(123));
        assert_eq!(
            response.headers().get(LAST_MODIFIED).unwrap(),
            "Thursday, 01 Jan 1970 00:02:03 GMT"
        );
    }

    #[test]
    fn test_location_for_redirects() {
        for code in [301, 302, 303, 307, 308] {
            let mut response = Response::with_status(code, "text/plain", "...");
            response.set_location("https://somewhere").unwrap();
            assert_eq!(response.headers().get(LOCATION).unwrap(), "https://somewhere");
        }
    }

    #[test]
    fn test_location_rejected_for_other_codes() {
        for code in [200, 201, 304, 404, 500] {
            let mut response = Response::with_status(code, "text/plain", "...");
            let err = response.set_location("https://somewhere").unwrap_err();
            assert_eq!(err, ResponseError::LocationRequiresRedirect { status_code: code });
            assert_eq!(
                err.to_string(),
                "Setting the location header is only meaningful for status codes 301, 302, 303, 307, and 308"
            );
            assert!(response.headers().is_empty());
        }

        let mut response = Response::default();
        assert!(response.set_location("https://somewhere").is_err());
    }
}
