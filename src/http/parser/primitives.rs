#[inline]
fn is_line_terminator(symbol: char) -> bool {
    symbol == '\r' || symbol == '\n'
}

// Drops the trailing "\n" or "\r\n" left by a line read
pub fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(is_line_terminator)
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

pub fn parse_header(header_line: &str) -> Option<(String, String)> {
    // header = name ":" value, split at the first colon.
    // Both sides are trimmed; lines without a colon carry no header.
    let (name, value) = header_line.split_once(':')?;
    Some((name.trim().to_string(), value.trim().to_string()))
}

// Each byte becomes one char, which matches the single-byte fixtures this server is fed
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte as char).collect()
}
