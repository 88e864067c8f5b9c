use super::primitives::{decode_latin1, is_blank, parse_header, strip_line_ending};
use super::ParseError;
use crate::dto::Request;
use http::Uri;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use url_encoded_data::UrlEncodedData;

// Request targets are resolved against this root; only path and query survive
const PLACEHOLDER_ROOT: &str = "http://host";

#[derive(Debug, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub target: &'a str,
}

pub fn parse_request_line(request_line: &str) -> Result<RequestLine<'_>, ParseError> {
    // Request-Line = Method SP Request-URI [SP HTTP-Version]
    let mut parts = request_line.split(' ');
    let method = parts.next().filter(|method| !method.is_empty());
    let target = parts.next().filter(|target| !target.is_empty());
    match (method, target) {
        (Some(method), Some(target)) => Ok(RequestLine { method, target }),
        _ => Err(ParseError::MalformedRequestLine(request_line.to_string())),
    }
}

pub fn parse_target(target: &str) -> Result<(String, IndexMap<String, String>), ParseError> {
    let uri = format!("{PLACEHOLDER_ROOT}{target}")
        .parse::<Uri>()
        .map_err(|_| ParseError::InvalidTarget(target.to_string()))?;

    // repeated keys overwrite the earlier value but keep its position
    let query_params = uri
        .query()
        .map(|query| {
            UrlEncodedData::from(query)
                .as_string_pairs()
                .into_iter()
                .collect()
        })
        .unwrap_or_default();

    let path = percent_decode_str(uri.path())
        .decode_utf8()
        .map_err(|_| ParseError::InvalidTarget(target.to_string()))?;

    Ok((path.into_owned(), query_params))
}

/// Reads one request off the connection.
///
/// Returns `Ok(None)` when the client closed the connection before sending a
/// request line. The body is read to exactly the declared `Content-Length`,
/// however the bytes happen to be split across reads.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }

    let request_line = parse_request_line(strip_line_ending(&line))?;
    let (path, query_params) = parse_target(request_line.target)?;
    let mut request = Request {
        method: request_line.method.to_string(),
        path,
        query_params,
        ..Default::default()
    };

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 || is_blank(&line) {
            break;
        }
        if let Some((name, value)) = parse_header(strip_line_ending(&line)) {
            request.headers.insert(name, value);
        }
    }

    let mut body = vec![0; request.content_length()?];
    reader.read_exact(&mut body).await?;
    request.body = decode_latin1(&body);

    Ok(Some(request))
}
