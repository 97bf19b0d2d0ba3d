use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Echo, Item, MockConfig};
use tower::ServiceExt;

const BEARER: &str = "Bearer abc";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, BEARER)
        .body(body.to_string())
        .unwrap()
}

fn authed(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, BEARER)
        .body(String::new())
        .unwrap()
}

fn login_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn login_returns_token() {
    let resp = app()
        .oneshot(login_request(
            "/auth/login",
            r#"{"username":"admin","password":"secret"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({"token": "abc"}));
}

#[tokio::test]
async fn login_uses_configured_token() {
    let config = MockConfig {
        token: "t-123".to_string(),
        ..MockConfig::default()
    };
    let resp = app_with(config)
        .oneshot(login_request(
            "/auth/login",
            r#"{"username":"admin","password":"secret"}"#,
        ))
        .await
        .unwrap();

    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["token"], "t-123");
}

#[tokio::test]
async fn login_wrong_password_returns_401() {
    let resp = app()
        .oneshot(login_request(
            "/auth/login",
            r#"{"username":"admin","password":"guess"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(&body_bytes(resp).await[..], b"invalid credentials");
}

#[tokio::test]
async fn login_malformed_json_returns_422() {
    let resp = app()
        .oneshot(login_request("/auth/login", r#"{"username":"admin"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn tokenless_login_has_no_token() {
    let resp = app()
        .oneshot(login_request("/auth/tokenless", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body.get("token").is_none());
}

// --- echo ---

#[tokio::test]
async fn echo_reports_query_and_authorization() {
    let resp = app().oneshot(authed("GET", "/echo?b=2&a=1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.get("a").map(String::as_str), Some("1"));
    assert_eq!(echo.query.get("b").map(String::as_str), Some("2"));
    assert_eq!(echo.authorization.as_deref(), Some(BEARER));
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn echo_reports_body() {
    let resp = app()
        .oneshot(json_request("PUT", "/echo", r#"{"x":1}"#))
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"x":1}"#);
}

#[tokio::test]
async fn echo_without_token_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/echo").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reflect_returns_body_verbatim() {
    let resp = app()
        .oneshot(json_request("POST", "/reflect", r#"{"x":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(&body_bytes(resp).await[..], br#"{"x":1}"#);
}

// --- status ---

#[tokio::test]
async fn status_replies_with_requested_code() {
    let resp = app().oneshot(authed("POST", "/status/503")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(&body_bytes(resp).await[..], b"status 503");
}

#[tokio::test]
async fn status_out_of_range_returns_400() {
    let resp = app().oneshot(authed("GET", "/status/42")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- large ---

#[tokio::test]
async fn large_returns_json_string_of_requested_length() {
    let resp = app().oneshot(authed("GET", "/large/16")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: String = body_json(resp).await;
    assert_eq!(body, "a".repeat(16));
}

#[tokio::test]
async fn large_with_status_returns_raw_text() {
    let resp = app()
        .oneshot(authed("GET", "/large/8?status=500"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body_bytes(resp).await[..], b"aaaaaaaa");
}

// --- items ---

#[tokio::test]
async fn list_items_requires_token() {
    let resp = app()
        .oneshot(Request::builder().uri("/items").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_item_returns_200() {
    let resp = app()
        .oneshot(json_request("POST", "/items", r#"{"name":"tea","quantity":3}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let item: Item = body_json(resp).await;
    assert_eq!(item.name, "tea");
    assert_eq!(item.quantity, 3);
}

#[tokio::test]
async fn get_item_not_found() {
    let resp = app()
        .oneshot(authed("GET", "/items/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_item_bad_uuid_returns_400() {
    let resp = app().oneshot(authed("GET", "/items/not-a-uuid")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_item_not_found() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/items/00000000-0000-0000-0000-000000000000",
            r#"{"name":"nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn item_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create two items
    for body in [r#"{"name":"tea","quantity":1}"#, r#"{"name":"coffee"}"#] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(json_request("POST", "/items", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // list is sorted by name
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/items"))
        .await
        .unwrap();
    let items: Vec<Item> = body_json(resp).await;
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["coffee", "tea"]);
    let tea = items[1].clone();

    // filter by name
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/items?name=tea"))
        .await
        .unwrap();
    let items: Vec<Item> = body_json(resp).await;
    assert_eq!(items, vec![tea.clone()]);

    // partial update keeps the name
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/items/{}", tea.id),
            r#"{"quantity":7}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Item = body_json(resp).await;
    assert_eq!(updated.name, "tea");
    assert_eq!(updated.quantity, 7);

    // delete returns the removed item
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("DELETE", &format!("/items/{}", tea.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let removed: Item = body_json(resp).await;
    assert_eq!(removed, updated);

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", &format!("/items/{}", tea.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
