use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chatter_relay::{AppState, ErrorBody, router};
use chatter_test::{
    mock::{self, AGENT_ID, API_KEY, MockServer, POST},
    sse, test,
};
use chatter_upstream::Client;
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use tower::ServiceExt as _;

const ORIGIN: &str = "http://localhost:3232";

fn state(server: &MockServer) -> AppState {
    AppState::new(Client::new(server.base_url(), API_KEY, AGENT_ID))
}

fn app(server: &MockServer) -> Router {
    router(state(server), ORIGIN).unwrap()
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[test(tokio::test)]
async fn create_conversation_attaches_configured_user_context() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(mock::conversations_path())
                .json_body_partial(r#"{ "userContext": { "organisationId": 1 } }"#);
            then.status(200)
                .json_body(json!({ "id": "c1", "createdAt": "now" }));
        })
        .await;

    let mut user_context = Map::new();
    user_context.insert("organisationId".to_owned(), json!(1));
    let app = router(state(&server).with_user_context(user_context), ORIGIN).unwrap();

    let response = app
        .oneshot(post("/create-conversation", &json!({ "ignored": true })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body, json!({ "id": "c1", "createdAt": "now" }));
    create.assert();
}

#[test(tokio::test)]
async fn create_conversation_failure_keeps_upstream_status() {
    let server = MockServer::start_async().await;
    let create = mock::create_conversation(&server, 500, json!({ "error": "database down" })).await;

    let response = app(&server)
        .oneshot(post("/create-conversation", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = body_json(response).await;
    assert!(body.error.contains("database down"), "{}", body.error);
    create.assert();
}

#[test(tokio::test)]
async fn unary_response_is_passed_through() {
    let server = MockServer::start_async().await;
    let upstream = json!({
        "id": "r1",
        "conversationId": "c1",
        "type": "table",
        "message": "Here you go",
        "table": { "head": ["a"], "body": [[1]] },
        "sources": ["kept"]
    });
    let respond = mock::unary_response(&server, "c1", 200, upstream.clone()).await;

    let response = app(&server)
        .oneshot(post(
            "/create-response",
            &json!({ "conversationId": "c1", "message": "show me", "stream": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body, upstream);
    respond.assert();
}

#[test(tokio::test)]
async fn streamed_response_relays_every_frame() {
    let server = MockServer::start_async().await;
    let payloads = [
        json!({ "type": "agent_step", "step": "S1", "message": "Looking up data" }),
        json!({ "type": "agent_step", "step": "S2" }),
        json!({
            "type": "completed",
            "id": "r1",
            "response": { "type": "text", "message": "Done" }
        }),
    ];
    let respond = mock::stream_response(&server, "c1", &payloads).await;

    let response = app(&server)
        .oneshot(post(
            "/create-response",
            &json!({ "conversationId": "c1", "message": "hi", "stream": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(body_text(response).await, sse::body(&payloads));
    respond.assert();
}

#[test(tokio::test)]
async fn streamed_response_without_upstream_sentinel_still_terminates() {
    let server = MockServer::start_async().await;
    let payloads = [json!({ "type": "agent_step", "step": "S1" })];
    let respond = server
        .mock_async(|when, then| {
            when.method(POST).path(mock::response_path("c1"));
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse::frames(&payloads));
        })
        .await;

    let response = app(&server)
        .oneshot(post(
            "/create-response",
            &json!({ "conversationId": "c1", "message": "hi", "stream": true }),
        ))
        .await
        .unwrap();

    assert_eq!(body_text(response).await, sse::body(&payloads));
    respond.assert();
}

#[test(tokio::test)]
async fn upstream_rejection_before_streaming_is_a_json_error() {
    let server = MockServer::start_async().await;
    let respond = server
        .mock_async(|when, then| {
            when.method(POST).path(mock::response_path("missing"));
            then.status(404)
                .json_body(json!({ "message": "conversation not found" }));
        })
        .await;

    let response = app(&server)
        .oneshot(post(
            "/create-response",
            &json!({ "conversationId": "missing", "message": "hi", "stream": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body: ErrorBody = body_json(response).await;
    assert!(body.error.contains("conversation not found"), "{}", body.error);
    respond.assert();
}

#[test(tokio::test)]
async fn blank_message_is_rejected_without_upstream_call() {
    let server = MockServer::start_async().await;
    let respond = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;

    for message in ["", "   \n\t"] {
        let response = app(&server)
            .oneshot(post(
                "/create-response",
                &json!({ "conversationId": "c1", "message": message, "stream": true }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.error, "message must not be empty");
    }

    respond.assert_hits(0);
}

#[test(tokio::test)]
async fn missing_conversation_id_is_rejected() {
    let server = MockServer::start_async().await;

    for body in [
        json!({ "message": "hi" }),
        json!({ "conversationId": "", "message": "hi" }),
    ] {
        let response = app(&server)
            .oneshot(post("/create-response", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.error, "conversationId is required");
    }
}

#[test(tokio::test)]
async fn malformed_body_is_a_bad_request() {
    let server = MockServer::start_async().await;
    let request = Request::builder()
        .method("POST")
        .uri("/create-response")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert!(!body.error.is_empty());
}

#[test(tokio::test)]
async fn errors_are_redacted_when_not_exposed() {
    let server = MockServer::start_async().await;
    let create = mock::create_conversation(&server, 503, json!({ "error": "secret detail" })).await;
    let app = router(state(&server).with_exposed_errors(false), ORIGIN).unwrap();

    let response = app
        .oneshot(post("/create-conversation", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body, ErrorBody::new("Something went wrong"));
    create.assert();
}

#[test(tokio::test)]
async fn unknown_route_is_not_found() {
    let server = MockServer::start_async().await;
    let app = router(state(&server).with_exposed_errors(false), ORIGIN).unwrap();

    let request = Request::builder()
        .uri("/does-not-exist")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body, ErrorBody::new("Route not found"));
}

#[test(tokio::test)]
async fn feedback_is_forwarded_upstream() {
    let server = MockServer::start_async().await;
    let forward = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{}/r1/feedback", mock::response_path("c1")))
                .json_body(json!({ "rating": 1 }));
            then.status(201).json_body(json!({ "id": "f1" }));
        })
        .await;

    let response = app(&server)
        .oneshot(post(
            "/conversations/c1/responses/r1/feedback",
            &json!({ "rating": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body, json!({ "id": "f1" }));
    forward.assert();
}

#[test(tokio::test)]
async fn cors_preflight_allows_configured_origin() {
    let server = MockServer::start_async().await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/create-response")
        .header(header::ORIGIN, ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ORIGIN
    );
}

#[test]
fn invalid_cors_origin_is_a_config_error() {
    let server = MockServer::start();
    let result = router(state(&server), "bad\norigin");

    assert!(matches!(result, Err(chatter_relay::Error::Config(_))));
}
