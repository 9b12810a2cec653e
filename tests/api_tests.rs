use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use murmur::config::Config;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single pooled connection so every request sees the same in-memory db.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    // Cheap Argon2 params; these tests are not measuring hash strength.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.server.secure_cookies = false;

    let state = murmur::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    murmur::api::router(state).await
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> serde_json::Value {
    let payload = serde_json::json!({
        "name": name,
        "email": email,
        "password": password,
        "password_confirmation": password,
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn post_with_token(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    payload: Option<serde_json::Value>,
) -> axum::response::Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json");

    let body = payload.map_or_else(Body::empty, |p| Body::from(p.to_string()));

    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

#[tokio::test]
async fn test_register_and_me() {
    let app = spawn_app().await;

    let body = register(&app, "Example User", "user@example.com", "foobar").await;
    assert_eq!(body["data"]["user"]["email"], "user@example.com");
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let response = post_with_token(&app, "GET", "/api/auth/me", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Example User");
    assert_eq!(body["data"]["is_admin"], false);
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app().await;

    let cases = [
        serde_json::json!({
            "name": " ",
            "email": "user@example.com",
            "password": "foobar",
            "password_confirmation": "foobar",
        }),
        serde_json::json!({
            "name": "Example User",
            "email": "user@foo,com",
            "password": "foobar",
            "password_confirmation": "foobar",
        }),
        serde_json::json!({
            "name": "Example User",
            "email": "user@example.com",
            "password": "foo",
            "password_confirmation": "foo",
        }),
        serde_json::json!({
            "name": "Example User",
            "email": "user@example.com",
            "password": "foobar",
            "password_confirmation": "mismatch",
        }),
    ];

    for payload in cases {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/users")
                    .header("Content-Type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "payload should be rejected: {payload}"
        );
    }
}

#[tokio::test]
async fn test_email_uniqueness_is_case_insensitive() {
    let app = spawn_app().await;

    register(&app, "First", "A@x.com", "foobar").await;

    let payload = serde_json::json!({
        "name": "Second",
        "email": "a@X.com",
        "password": "foobar",
        "password_confirmation": "foobar",
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Email has already been taken");
}

#[tokio::test]
async fn test_login_failure_is_generic() {
    let app = spawn_app().await;

    register(&app, "Example User", "user@example.com", "foobar").await;

    let unknown_email = serde_json::json!({
        "email": "nobody@example.com",
        "password": "foobar",
    });
    let wrong_password = serde_json::json!({
        "email": "user@example.com",
        "password": "invalid",
    });

    let mut errors = Vec::new();
    for payload in [unknown_email, wrong_password] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("Content-Type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        errors.push(body_json(response).await["error"].clone());
    }

    // Unknown email and wrong password are indistinguishable.
    assert_eq!(errors[0], errors[1]);
}

#[tokio::test]
async fn test_login_issues_working_token() {
    let app = spawn_app().await;

    register(&app, "Example User", "user@example.com", "foobar").await;

    let payload = serde_json::json!({
        "email": "User@Example.COM",
        "password": "foobar",
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_with_token(&app, "GET", "/api/auth/me", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_invalidates_token_server_side() {
    let app = spawn_app().await;

    let body = register(&app, "Example User", "user@example.com", "foobar").await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let response = post_with_token(&app, "POST", "/api/auth/logout", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The digest is cleared, so the captured token no longer authenticates.
    let response = post_with_token(&app, "GET", "/api/auth/me", &token, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_supersedes_previous_token() {
    let app = spawn_app().await;

    let body = register(&app, "Example User", "user@example.com", "foobar").await;
    let first_token = body["data"]["token"].as_str().unwrap().to_string();

    let payload = serde_json::json!({
        "email": "user@example.com",
        "password": "foobar",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let second_token = body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Last writer wins: only the newest token still resolves.
    let response = post_with_token(&app, "GET", "/api/auth/me", &first_token, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_with_token(&app, "GET", "/api/auth/me", &second_token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = spawn_app().await;

    for uri in ["/api/feed", "/api/auth/me", "/api/users"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {uri}"
        );
    }
}

#[tokio::test]
async fn test_microposts_and_feed_flow() {
    let app = spawn_app().await;

    let alice = register(&app, "Alice", "alice@example.com", "foobar").await;
    let alice_token = alice["data"]["token"].as_str().unwrap().to_string();
    let bob = register(&app, "Bob", "bob@example.com", "foobar").await;
    let bob_token = bob["data"]["token"].as_str().unwrap().to_string();
    let bob_id = bob["data"]["user"]["id"].as_i64().unwrap();

    let response = post_with_token(
        &app,
        "POST",
        "/api/microposts",
        &bob_token,
        Some(serde_json::json!({ "content": "Dolor sit" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_with_token(
        &app,
        "POST",
        "/api/microposts",
        &alice_token,
        Some(serde_json::json!({ "content": "Lorem ipsum" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Before following, Alice only sees her own post.
    let response = post_with_token(&app, "GET", "/api/feed", &alice_token, None).await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["posts"][0]["content"], "Lorem ipsum");

    let response = post_with_token(
        &app,
        "POST",
        &format!("/api/users/{bob_id}/follow"),
        &alice_token,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["following"], true);
    assert_eq!(body["data"]["followers_count"], 1);

    // After following, Bob's post appears; newest first.
    let response = post_with_token(&app, "GET", "/api/feed", &alice_token, None).await;
    let body = body_json(response).await;
    let posts = body["data"]["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["content"], "Lorem ipsum");
    assert_eq!(posts[1]["content"], "Dolor sit");

    // Filter narrows to the matching subset.
    let response =
        post_with_token(&app, "GET", "/api/feed?filter=Dolor", &alice_token, None).await;
    let body = body_json(response).await;
    let posts = body["data"]["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "Dolor sit");

    // Unfollow removes Bob's posts from the feed again.
    let response = post_with_token(
        &app,
        "DELETE",
        &format!("/api/users/{bob_id}/follow"),
        &alice_token,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_with_token(&app, "GET", "/api/feed", &alice_token, None).await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["posts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_micropost_delete_is_owner_only() {
    let app = spawn_app().await;

    let alice = register(&app, "Alice", "alice@example.com", "foobar").await;
    let alice_token = alice["data"]["token"].as_str().unwrap().to_string();
    let bob = register(&app, "Bob", "bob@example.com", "foobar").await;
    let bob_token = bob["data"]["token"].as_str().unwrap().to_string();

    let response = post_with_token(
        &app,
        "POST",
        "/api/microposts",
        &alice_token,
        Some(serde_json::json!({ "content": "Mine" })),
    )
    .await;
    let post_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_with_token(
        &app,
        "DELETE",
        &format!("/api/microposts/{post_id}"),
        &bob_token,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_with_token(
        &app,
        "DELETE",
        &format!("/api/microposts/{post_id}"),
        &alice_token,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_delete_requires_admin() {
    let app = spawn_app().await;

    let alice = register(&app, "Alice", "alice@example.com", "foobar").await;
    let alice_token = alice["data"]["token"].as_str().unwrap().to_string();
    let bob = register(&app, "Bob", "bob@example.com", "foobar").await;
    let bob_id = bob["data"]["user"]["id"].as_i64().unwrap();

    let response = post_with_token(
        &app,
        "DELETE",
        &format!("/api/users/{bob_id}"),
        &alice_token,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registration_rejected_when_signed_in() {
    let app = spawn_app().await;

    let alice = register(&app, "Alice", "alice@example.com", "foobar").await;
    let alice_token = alice["data"]["token"].as_str().unwrap().to_string();

    let response = post_with_token(
        &app,
        "POST",
        "/api/users",
        &alice_token,
        Some(serde_json::json!({
            "name": "Second",
            "email": "second@example.com",
            "password": "foobar",
            "password_confirmation": "foobar",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_index_supports_search() {
    let app = spawn_app().await;

    let alice = register(&app, "Alice", "alice@example.com", "foobar").await;
    let alice_token = alice["data"]["token"].as_str().unwrap().to_string();
    register(&app, "Bob", "bob@example.com", "foobar").await;

    let response = post_with_token(&app, "GET", "/api/users?search=Bob", &alice_token, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "Bob");
}
