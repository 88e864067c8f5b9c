use crate::dto::Response;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const SERVER_NAME: &str = "StubServer";

const DATE_FORMAT: &str = "%a %b %d %H:%M:%S UTC %Y";

/// Renders the response as sent on the wire.
///
/// Lines end with a bare `\n` and the body gets no terminator. `Content-length`
/// counts characters, not encoded bytes.
pub fn render_response(response: &Response, date: DateTime<Utc>) -> String {
    let mut out = format!(
        "HTTP/1.1 {}\nServer: {}\nDate: {}\nContent-type: {}\nContent-length: {}\n",
        response.status_code(),
        SERVER_NAME,
        date.format(DATE_FORMAT),
        response.mime_type(),
        response.body().chars().count()
    );
    for (key, value) in response.headers() {
        out.push_str(&format!("{}: {}\n", key, value));
    }
    out.push('\n');
    out.push_str(response.body());
    out
}

pub async fn write_response<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let rendered = render_response(response, Utc::now());
    writer.write_all(rendered.as_bytes()).await?;
    writer.flush().await
}
