//! Server-Sent Events decoding for the chat stream.

use async_stream::stream;
use futures::{Stream, StreamExt};
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Decode an SSE response into a stream of JSON payloads.
///
/// Keep-alive comments and events without data are skipped. The stream ends
/// when the server closes the connection.
pub(crate) fn decode_events<T>(response: Response) -> impl Stream<Item = Result<T, ClientError>>
where
    T: DeserializeOwned,
{
    stream! {
        let mut buffer: Vec<u8> = Vec::new();
        let mut byte_stream = std::pin::pin!(response.bytes_stream());

        while let Some(chunk_result) = byte_stream.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend_from_slice(&chunk);

                    while let Some(event) = extract_sse_event(&mut buffer) {
                        if let Some(parsed) = parse_sse_event(&event) {
                            yield parsed;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Event stream interrupted");
                    yield Err(ClientError::Http(e));
                    break;
                }
            }
        }
    }
}

/// Split the next complete event (terminated by a blank line) off the buffer.
///
/// Works on bytes so a multi-byte character split across chunks is only
/// decoded once the whole event has arrived.
fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<String> {
    let idx = buffer.windows(2).position(|w| w == b"\n\n")?;
    let event = String::from_utf8_lossy(&buffer[..idx]).into_owned();
    buffer.drain(..idx + 2);
    Some(event)
}

/// Parse one event. `None` for comments, pings and events without data.
fn parse_sse_event<T: DeserializeOwned>(event: &str) -> Option<Result<T, ClientError>> {
    if event.trim().is_empty() {
        return None;
    }

    let mut data: Option<String> = None;
    for line in event.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match &mut data {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }

    let data = data?;
    Some(serde_json::from_str(&data).map_err(|e| {
        ClientError::Decode(format!("Failed to parse stream event: {e}"))
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_extract_waits_for_blank_line() {
        let mut buffer = b"event: message\ndata: {}".to_vec();
        assert!(extract_sse_event(&mut buffer).is_none());

        buffer.extend_from_slice(b"\n\nevent: message\n");
        assert_eq!(
            extract_sse_event(&mut buffer).as_deref(),
            Some("event: message\ndata: {}")
        );
        assert_eq!(buffer, b"event: message\n");
    }

    #[test]
    fn test_split_multibyte_character() {
        let full = "data: {\"text\":\"caf\u{e9}\"}\n\n".as_bytes();
        let split = full.len() - 5;
        let mut buffer = full[..split].to_vec();
        assert!(extract_sse_event(&mut buffer).is_none());
        buffer.extend_from_slice(&full[split..]);

        let event = extract_sse_event(&mut buffer).unwrap();
        let value: Value = parse_sse_event(&event).unwrap().unwrap();
        assert_eq!(value["text"], "caf\u{e9}");
    }

    #[test]
    fn test_keep_alive_is_skipped() {
        assert!(parse_sse_event::<Value>(":").is_none());
        assert!(parse_sse_event::<Value>("event: message\nid: 4").is_none());
        assert!(parse_sse_event::<Value>("").is_none());
    }

    #[test]
    fn test_data_with_and_without_space() {
        let a: Value = parse_sse_event("data: {\"n\":1}").unwrap().unwrap();
        let b: Value = parse_sse_event("data:{\"n\":1}").unwrap().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_multiline_data_is_joined() {
        let value: Value = parse_sse_event("event: message\ndata: {\"n\":\ndata: 2}")
            .unwrap()
            .unwrap();
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn test_bad_json_is_decode_error() {
        let err = parse_sse_event::<Value>("data: nope").unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
