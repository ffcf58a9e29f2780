use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use futures_util::{Stream, StreamExt};

mod terminator;

pub use terminator::{Terminator, TerminatorState};

/// Sentinel line closing an OpenAI-style event stream.
pub const DONE_MARKER: &[u8] = b"data: [DONE]";

pub const EVENT_STREAM: &str = "text/event-stream";

/// Formats `payload` as one server-sent event carrying only `data:` lines.
pub fn data_frame(payload: &str) -> Bytes {
    let mut frame = String::with_capacity(payload.len() + 8);
    for line in payload.lines() {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    Bytes::from(frame)
}

pub fn done_frame() -> Bytes {
    data_frame("[DONE]")
}

/// Streamed response; the connection is closed once the body ends.
pub fn event_stream_response(status: StatusCode, content_type: HeaderValue, body: Body) -> Response {
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    resp
}

struct RelayState<S> {
    source: Pin<Box<S>>,
    terminator: Terminator,
    done: bool,
}

impl<S> Drop for RelayState<S> {
    fn drop(&mut self) {
        if !self.done {
            tracing::info!("Caller went away mid-stream; abandoning upstream read");
        }
    }
}

/// Relays `source` chunk by chunk, guaranteeing a single trailing termination marker.
///
/// Reading stops as soon as the upstream marker has been forwarded. An upstream read
/// error ends the relay early and is reported only through the log.
pub fn relay_stream<S, E>(source: S) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = RelayState {
        source: Box::pin(source),
        terminator: Terminator::new(),
        done: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if state.done {
                return None;
            }
            if state.terminator.is_terminated() {
                state.done = true;
                return None;
            }

            match state.source.next().await {
                Some(Ok(chunk)) => {
                    let out = state.terminator.feed(chunk);
                    if out.is_empty() {
                        continue;
                    }
                    return Some((Ok(out), state));
                }
                Some(Err(e)) => {
                    tracing::warn!("Upstream stream read failed: {}", e);
                    state.done = true;
                    let tail = state.terminator.finish()?;
                    return Some((Ok(tail), state));
                }
                None => {
                    state.done = true;
                    let tail = state.terminator.finish()?;
                    return Some((Ok(tail), state));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn collect<S>(stream: S) -> String
    where
        S: Stream<Item = Result<Bytes, Infallible>>,
    {
        let parts: Vec<_> = stream.collect().await;
        let mut out = Vec::new();
        for part in parts {
            out.extend_from_slice(&part.unwrap());
        }
        String::from_utf8(out).unwrap()
    }

    fn source(
        chunks: Vec<Result<&'static str, &'static str>>,
    ) -> impl Stream<Item = Result<Bytes, &'static str>> + Send + 'static {
        futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map(|s| Bytes::from_static(s.as_bytes()))),
        )
    }

    #[test]
    fn data_frame_prefixes_each_line() {
        assert_eq!(data_frame("{\"a\":1}"), Bytes::from_static(b"data: {\"a\":1}\n\n"));
        assert_eq!(data_frame("a\nb"), Bytes::from_static(b"data: a\ndata: b\n\n"));
        assert_eq!(done_frame(), Bytes::from_static(b"data: [DONE]\n\n"));
    }

    #[tokio::test]
    async fn relay_passes_chunks_and_keeps_upstream_marker() {
        let out = collect(relay_stream(source(vec![
            Ok("data: {\"x\":1}\n\n"),
            Ok("data: [DONE]\n\n"),
            Ok("data: {\"ignored\":1}\n\n"),
        ])))
        .await;
        assert_eq!(out, "data: {\"x\":1}\n\ndata: [DONE]\n\n");
    }

    #[tokio::test]
    async fn relay_injects_marker_when_upstream_omits_it() {
        let out = collect(relay_stream(source(vec![Ok("data: {\"x\":1}\n\n")]))).await;
        assert_eq!(out, "data: {\"x\":1}\n\ndata: [DONE]\n\n");
    }

    #[tokio::test]
    async fn relay_closes_with_marker_after_read_error() {
        let out = collect(relay_stream(source(vec![
            Ok("data: {\"x\":1}\n\n"),
            Err("connection reset"),
            Ok("data: {\"never\":1}\n\n"),
        ])))
        .await;
        assert_eq!(out, "data: {\"x\":1}\n\ndata: [DONE]\n\n");
    }

    #[tokio::test]
    async fn dropped_relay_stops_reading_upstream() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let endless = futures_util::stream::repeat_with(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, &'static str>(Bytes::from_static(b"data: {\"x\":1}\n\n"))
        });

        let mut relay = Box::pin(relay_stream(endless));
        let first = relay.next().await.unwrap().unwrap();
        assert_eq!(first, Bytes::from_static(b"data: {\"x\":1}\n\n"));
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        // Caller hung up: the source (and its counter clone) goes with the relay.
        drop(relay);
        assert_eq!(Arc::strong_count(&reads), 1);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_stream_response_marks_connection_close() {
        let resp = event_stream_response(
            StatusCode::OK,
            HeaderValue::from_static(EVENT_STREAM),
            Body::empty(),
        );
        assert_eq!(resp.headers()[header::CONNECTION], "close");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(resp.headers()[header::CONTENT_TYPE], EVENT_STREAM);
    }
}
