mod common;
use common::{client, client_with, form_keys, sorted_query, FakeApi, TestClock, NOW};

use nable_mcp::services::nable_client::ApiResult;
use reqwest::Method;
use serde_json::{json, Map, Value};

fn obj(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

#[tokio::test]
async fn valid_token_is_reused_across_requests() {
    let api = FakeApi::new();
    let client = client(api.clone());

    client.get("/patients/1", None).await.expect("first call");
    client.get("/patients/2", None).await.expect("second call");

    assert_eq!(api.token_calls(), 1, "a fresh token must not be re-issued");
    assert_eq!(api.api_paths(), vec!["/patients/1", "/patients/2"]);
}

#[tokio::test]
async fn token_inside_margin_is_refreshed() {
    let api = FakeApi::new();
    api.push_token(200, &json!({"token": "first", "expires_at": NOW + 60}).to_string());
    api.push_token(200, &json!({"token": "second", "expires_at": NOW + 3_600}).to_string());
    let client = client(api.clone());

    client.get("/appointments", None).await.expect("call");
    // expires_at - now == 60: the first token is already stale
    client.get("/appointments", None).await.expect("call");

    assert_eq!(api.token_calls(), 2);
    let bearers: Vec<Option<String>> = api.api_requests().into_iter().map(|r| r.bearer).collect();
    assert_eq!(
        bearers,
        vec![Some("first".to_string()), Some("second".to_string())]
    );
}

#[tokio::test]
async fn token_just_outside_margin_is_kept() {
    let api = FakeApi::new();
    api.push_token(200, &json!({"token": "only", "expires_at": NOW + 61}).to_string());
    let clock = TestClock::at(NOW);
    let client = client_with(api.clone(), &clock);

    client.get("/appointments", None).await.expect("call");
    client.get("/appointments", None).await.expect("call");
    assert_eq!(api.token_calls(), 1);

    clock.set(NOW + 1);
    client.get("/appointments", None).await.expect("call");
    assert_eq!(api.token_calls(), 2, "clock advanced into the margin");
}

#[tokio::test]
async fn expiry_is_read_from_either_field_name() {
    let api = FakeApi::new();
    api.push_token(200, &json!({"token": "a", "expired_at": NOW + 500}).to_string());
    let client = client(api.clone());
    client.ensure_token().await.expect("token");
    assert_eq!(client.session().await.expect("session").expires_at, NOW + 500);

    let api = FakeApi::new();
    api.push_token(201, &json!({"token": "b", "expires_at": (NOW + 700).to_string()}).to_string());
    let client = common::client(api.clone());
    client.ensure_token().await.expect("token");
    let session = client.session().await.expect("session");
    assert_eq!(session.token, "b");
    assert_eq!(session.expires_at, NOW + 700);
}

#[tokio::test]
async fn missing_expiry_forces_refresh_every_call() {
    let api = FakeApi::new();
    api.push_token(200, r#"{"token": "no-expiry"}"#);
    let client = client(api.clone());

    client.get("/appointments", None).await.expect("call");
    client.get("/appointments", None).await.expect("call");
    assert_eq!(api.token_calls(), 2);
}

#[tokio::test]
async fn extreme_negative_expiry_is_stale_not_fresh() {
    let api = FakeApi::new();
    api.push_token(
        200,
        r#"{"token": "t", "expires_at": "-9223372036854775808"}"#,
    );
    let client = client(api.clone());

    client.get("/appointments", None).await.expect("call");
    client.get("/appointments", None).await.expect("call");
    assert_eq!(api.token_calls(), 2);
}

#[tokio::test]
async fn token_request_sends_form_credentials() {
    let api = FakeApi::new();
    let client = client(api.clone());
    client.ensure_token().await.expect("token");

    let request = api.requests().into_iter().next().expect("token request");
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, format!("{}/tokens", common::BASE_URL));
    assert_eq!(request.bearer, None);
    assert_eq!(
        request.form,
        vec![
            ("username".to_string(), "clinic.user".to_string()),
            ("password".to_string(), "s3cret".to_string()),
        ]
    );
}

#[tokio::test]
async fn rejected_credentials_fail_with_status_and_body() {
    let api = FakeApi::new();
    api.push_token(401, "invalid credentials");
    let client = client(api.clone());

    let err = client
        .get("/patients/1", None)
        .await
        .expect_err("authentication must fail");
    assert!(err.is_authentication());
    assert_eq!(err.message, "Authentication failed: 401 invalid credentials");
    let details = err.details.expect("details");
    assert_eq!(details["status"], 401);
    assert_eq!(details["body"], "invalid credentials");
    assert!(api.api_requests().is_empty(), "no API call after auth failure");
    assert!(client.session().await.is_none());
}

#[tokio::test]
async fn success_without_token_field_is_an_authentication_failure() {
    let api = FakeApi::new();
    api.push_token(200, r#"{"expires_at": 1}"#);
    let client = client(api.clone());
    let err = client.ensure_token().await.expect_err("must fail");
    assert!(err.is_authentication());
}

#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
    let api = FakeApi::with_token_delay(25);
    let client = client(api.clone());

    let (a, b, c) = tokio::join!(
        client.get("/patients/1", None),
        client.get("/patients/2", None),
        client.get("/patients/3", None),
    );
    a.expect("a");
    b.expect("b");
    c.expect("c");

    assert_eq!(api.token_calls(), 1);
    assert_eq!(api.api_requests().len(), 3);
}

#[tokio::test]
async fn get_sends_query_and_bearer() {
    let api = FakeApi::new();
    let client = client(api.clone());
    let query = obj(json!({"date": "2024-05-01", "past": true}));

    client
        .request(Method::GET, "/appointments", Some(&query), None)
        .await
        .expect("call");

    let request = api.api_requests().pop().expect("request");
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.bearer.as_deref(), Some("tok-default"));
    assert_eq!(
        sorted_query(&request),
        vec![
            ("date".to_string(), "2024-05-01".to_string()),
            ("past".to_string(), "true".to_string()),
        ]
    );
    assert!(request.form.is_empty());
}

#[tokio::test]
async fn post_sends_form_body() {
    let api = FakeApi::new();
    let client = client(api.clone());
    let form = obj(json!({"to": "clinic", "subject": "hi", "message": "hello"}));

    client.post("/patients/5/messages", Some(&form)).await.expect("call");

    let request = api.api_requests().pop().expect("request");
    assert_eq!(request.method, Method::POST);
    assert!(request.query.is_empty());
    assert_eq!(form_keys(&request), vec!["message", "subject", "to"]);
}

#[tokio::test]
async fn error_statuses_come_back_as_envelopes() {
    let api = FakeApi::new();
    api.route("/patients/404", 404, r#"{"message": "not found"}"#);
    api.route("/patients/500", 500, "upstream exploded");
    let client = client(api.clone());

    let missing = client.get("/patients/404", None).await.expect("envelope");
    assert_eq!(
        missing.into_value(),
        json!({"status_code": 404, "success": false, "data": {"message": "not found"}})
    );

    let broken = client.get("/patients/500", None).await.expect("envelope");
    assert_eq!(
        broken.into_value(),
        json!({"status_code": 500, "success": false, "data": "upstream exploded"})
    );
}

#[tokio::test]
async fn empty_body_yields_no_data() {
    let api = FakeApi::new();
    api.route("/patients/7/messages", 204, "");
    let client = client(api.clone());

    let result = client.post("/patients/7/messages", None).await.expect("envelope");
    let envelope = result.envelope().expect("envelope").clone();
    assert!(envelope.success);
    assert_eq!(envelope.data, None);
    assert_eq!(result.into_value(), json!({"status_code": 204, "success": true}));
}

#[tokio::test]
async fn unsupported_method_is_reported_as_data() {
    let api = FakeApi::new();
    let client = client(api.clone());

    let result = client
        .request(Method::DELETE, "/patients/1", None, None)
        .await
        .expect("data result");
    assert_eq!(
        result,
        ApiResult::UnsupportedMethod {
            error: "Unknown method: DELETE".to_string()
        }
    );
    assert!(api.api_requests().is_empty());
}

#[tokio::test]
async fn transport_failure_propagates() {
    let api = FakeApi::new();
    api.make_unreachable("/patients/1");
    let client = client(api.clone());

    let err = client
        .get("/patients/1", None)
        .await
        .expect_err("transport failure");
    assert!(err.is_transport());
    assert!(err.message.contains("connection refused"));
}
