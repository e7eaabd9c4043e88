use crate::domain::message::{Direction, MessageTag, MessageType};
use axum::http::HeaderMap;

pub const MESSAGE_TYPE_HEADER: &str = "Message-Type";

/// Canonical decimal only: no sign, no whitespace, no leading zeros.
fn parse_code(raw: &str) -> Option<u16> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if raw.len() > 1 && raw.starts_with('0') {
        return None;
    }
    raw.parse().ok()
}

/// Tags a request by the `/.../msg/<n>` convention on its path.
pub fn classify_request(path: &str) -> MessageTag {
    let mut segments = path.rsplit('/');
    let code = match (segments.next(), segments.next()) {
        (Some(last), Some("msg")) => parse_code(last),
        _ => None,
    };

    match code {
        Some(code) => MessageTag::observed(MessageType::from_code(code), Direction::Request),
        None => MessageTag::other(Direction::Request),
    }
}

/// Tags a response by its `Message-Type` header.
pub fn classify_response(headers: &HeaderMap) -> MessageTag {
    let code = headers
        .get(MESSAGE_TYPE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_code);

    match code {
        Some(code) => MessageTag::observed(MessageType::from_code(code), Direction::Response),
        None => MessageTag::other(Direction::Response),
    }
}
