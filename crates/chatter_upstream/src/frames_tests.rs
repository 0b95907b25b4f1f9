use std::io;

use assert_matches::assert_matches;
use futures::{StreamExt as _, stream};
use pretty_assertions::assert_eq;

use super::*;

const TIMEOUT: Duration = Duration::from_secs(5);

fn lines(
    lines: &[&str],
) -> impl Stream<Item = std::result::Result<String, LinesCodecError>> + Send + use<> {
    let lines = lines
        .iter()
        .map(|line| Ok((*line).to_owned()))
        .collect::<Vec<_>>();

    stream::iter(lines)
}

async fn collect(
    stream: impl Stream<Item = Result<Box<RawValue>>>,
) -> Vec<std::result::Result<String, String>> {
    stream
        .map(|item| item.map(|raw| raw.get().to_owned()).map_err(|e| e.to_string()))
        .collect()
        .await
}

#[tokio::test]
async fn yields_payloads_verbatim_until_sentinel() {
    let input = lines(&[
        r#"data: {"type":"agent_step","step":"lookup"}"#,
        "",
        ": keep-alive",
        r#"data:{"b":  2}"#,
        "",
        "data: [DONE]",
        r#"data: {"never":"seen"}"#,
    ]);

    let frames = collect(frames(input, TIMEOUT, 1024)).await;

    assert_eq!(frames, vec![
        Ok(r#"{"type":"agent_step","step":"lookup"}"#.to_owned()),
        Ok(r#"{"b":  2}"#.to_owned()),
    ]);
}

#[tokio::test]
async fn ends_quietly_without_sentinel() {
    let input = lines(&[r#"data: {"a":1}"#, ""]);
    let frames = collect(frames(input, TIMEOUT, 1024)).await;

    assert_eq!(frames, vec![Ok(r#"{"a":1}"#.to_owned())]);
}

#[tokio::test]
async fn transport_failure_is_terminal() {
    let input = stream::iter(vec![
        Ok(r#"data: {"a":1}"#.to_owned()),
        Err(LinesCodecError::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset",
        ))),
        Ok(r#"data: {"b":2}"#.to_owned()),
    ]);

    let mut frames = Box::pin(frames(input, TIMEOUT, 1024));

    assert_matches!(frames.next().await, Some(Ok(_)));
    assert_matches!(frames.next().await, Some(Err(Error::Stream(msg))) if msg.contains("connection reset"));
    assert_matches!(frames.next().await, None);
}

#[tokio::test]
async fn invalid_json_is_terminal() {
    let input = lines(&["data: {not json", r#"data: {"a":1}"#]);
    let mut frames = Box::pin(frames(input, TIMEOUT, 1024));

    assert_matches!(frames.next().await, Some(Err(Error::Json(_))));
    assert_matches!(frames.next().await, None);
}

#[tokio::test]
async fn oversized_frame_is_terminal() {
    let input = stream::iter(vec![Err(LinesCodecError::MaxLineLengthExceeded)]);
    let mut frames = Box::pin(frames(input, TIMEOUT, 16));

    assert_matches!(frames.next().await, Some(Err(Error::FrameTooLarge(16))));
    assert_matches!(frames.next().await, None);
}

#[tokio::test]
async fn idle_upstream_times_out() {
    let input = lines(&[r#"data: {"a":1}"#]).chain(stream::pending());
    let mut frames = Box::pin(frames(input, Duration::from_millis(20), 1024));

    assert_matches!(frames.next().await, Some(Ok(_)));
    assert_matches!(frames.next().await, Some(Err(Error::Timeout(d))) if d == Duration::from_millis(20));
    assert_matches!(frames.next().await, None);
}
