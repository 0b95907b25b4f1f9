use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::{Cell, Table};

#[test]
fn parses_step_aliases() {
    for tag in ["agent_step", "response.agent_step"] {
        let payload = json!({ "type": tag, "step": "lookup", "message": "Looking up" }).to_string();
        assert_eq!(
            StreamEvent::from_payload(&payload).unwrap(),
            StreamEvent::step("lookup", "Looking up")
        );
    }
}

#[test]
fn parses_completed_aliases() {
    for tag in ["completed", "response.completed"] {
        let payload = json!({
            "type": tag,
            "id": "r1",
            "response": { "type": "table", "message": "rows", "table": { "head": ["x"], "body": [["1"]] } }
        })
        .to_string();

        assert_eq!(
            StreamEvent::from_payload(&payload).unwrap(),
            StreamEvent::completed("r1", Response::Table {
                message: "rows".to_owned(),
                table: Table {
                    head: vec!["x".to_owned()],
                    body: vec![vec![Cell::from("1")]],
                },
            })
        );
    }
}

#[test]
fn step_label_is_opaque() {
    let payload = json!({ "type": "agent_step", "step": { "n": 1 } }).to_string();
    assert_eq!(
        StreamEvent::from_payload(&payload).unwrap(),
        StreamEvent::step(r#"{"n":1}"#, "")
    );
}

#[test]
fn error_descriptions() {
    let cases = [
        (json!({ "type": "error", "error": "boom" }), "boom"),
        (json!({ "type": "error", "error": { "message": "bad gateway" } }), "bad gateway"),
        (json!({ "type": "error", "error": { "code": 7 } }), r#"{"code":7}"#),
        (json!({ "type": "error" }), "unknown error"),
        (json!({ "error": "legacy relay" }), "legacy relay"),
    ];

    for (payload, expected) in cases {
        assert_eq!(
            StreamEvent::from_payload(&payload.to_string()).unwrap(),
            StreamEvent::error(expected),
            "payload: {payload}"
        );
    }
}

#[test]
fn unknown_event_type_is_malformed() {
    let result = StreamEvent::from_payload(r#"{"type":"heartbeat"}"#);
    assert_matches!(result, Err(Error::MalformedFrame(_)));

    let result = StreamEvent::from_payload(r#"{"type":"agent_step""#);
    assert_matches!(result, Err(Error::MalformedFrame(_)));
}

#[test]
fn serializes_with_canonical_tags() {
    let step = StreamEvent::step("lookup", "Looking up").to_payload().unwrap();
    assert_eq!(step, r#"{"type":"agent_step","step":"lookup","message":"Looking up"}"#);

    let error = StreamEvent::error("boom").to_payload().unwrap();
    assert_eq!(error, r#"{"type":"error","error":"boom"}"#);
}

#[test]
fn terminal_events() {
    assert!(!StreamEvent::step("a", "b").is_terminal());
    assert!(StreamEvent::error("x").is_terminal());
    assert!(StreamEvent::completed("r", Response::text("hi")).is_terminal());
}
