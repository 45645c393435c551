//! HTTP-boundary tests for the API client: bearer-token attachment,
//! the 401-clears-session policy, and error passthrough for everything
//! else. Backed by a local wiremock server.

use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use moneymate::api::{ApiClient, ApiError};
use moneymate::auth::{MemoryStorage, Session, SessionData};
use moneymate::models::{SignupRequest, User};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn test_client(base_url: &str, resend_path: &str) -> (ApiClient, Arc<Mutex<Session>>) {
    let session = Arc::new(Mutex::new(Session::new(Box::<MemoryStorage>::default())));
    let client = ApiClient::new(base_url, resend_path, Arc::clone(&session))
        .expect("Failed to build client");
    (client, session)
}

fn seeded_session_data(token: &str) -> SessionData {
    SessionData::new(
        token.to_string(),
        User {
            id: Some(1),
            username: Some("maya".to_string()),
            email: "a@b.com".to_string(),
            phone_number: None,
        },
    )
}

fn session_token(session: &Arc<Mutex<Session>>) -> Option<String> {
    let session = session.lock().unwrap_or_else(|e| e.into_inner());
    session.token().map(str::to_string)
}

#[tokio::test]
async fn login_stores_token_and_next_request_bears_it() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "a@b.com",
            "password": "Secret1!"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "T1",
            "user": { "id": 1, "username": "maya", "email": "a@b.com" }
        })))
        .mount(&server)
        .await;

    // The matcher only answers when the exact bearer header is present,
    // so a 200 here proves the token was attached.
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (client, session) = test_client(&server.uri(), "/auth/resend-otp");

    let data = client
        .login("a@b.com", "Secret1!")
        .await
        .expect("Login failed");
    assert_eq!(data.token, "T1");
    assert_eq!(session_token(&session).as_deref(), Some("T1"));

    let accounts: serde_json::Value = client
        .get("/accounts")
        .await
        .expect("Authenticated GET failed");
    assert!(accounts.as_array().is_some());
}

#[tokio::test]
async fn anonymous_requests_carry_no_authorization_header() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (client, _session) = test_client(&server.uri(), "/auth/resend-otp");

    let request = SignupRequest {
        username: "maya".to_string(),
        email: "a@b.com".to_string(),
        phone_number: "5551234567".to_string(),
        password: "Secret1!".to_string(),
    };
    client.signup(&request).await.expect("Signup failed");

    let received = server
        .received_requests()
        .await
        .expect("Request recording disabled");
    assert_eq!(received.len(), 1);
    assert!(
        !received[0].headers.contains_key("authorization"),
        "anonymous request must not carry an Authorization header"
    );
}

#[tokio::test]
async fn unauthorized_response_clears_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (client, session) = test_client(&server.uri(), "/auth/resend-otp");
    session
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .update(seeded_session_data("stale-token"));

    let result: Result<serde_json::Value, ApiError> = client.get("/accounts").await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(session_token(&session), None);
    assert!(!client.is_authenticated());

    // The next request must go out without an Authorization header
    let _: Result<serde_json::Value, ApiError> = client.get("/accounts").await;
    let received = server
        .received_requests()
        .await
        .expect("Request recording disabled");
    assert_eq!(received.len(), 2);
    assert!(received[0].headers.contains_key("authorization"));
    assert!(!received[1].headers.contains_key("authorization"));
}

#[tokio::test]
async fn conflict_on_signup_passes_through_without_touching_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(409).set_body_string("account exists"))
        .mount(&server)
        .await;

    let (client, session) = test_client(&server.uri(), "/auth/resend-otp");
    session
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .update(seeded_session_data("T1"));

    let request = SignupRequest {
        username: "maya".to_string(),
        email: "a@b.com".to_string(),
        phone_number: "5551234567".to_string(),
        password: "Secret1!".to_string(),
    };
    match client.signup(&request).await {
        Err(ApiError::Conflict(body)) => assert_eq!(body, "account exists"),
        other => panic!("expected Conflict, got {other:?}"),
    }

    // 409 performs no session mutation
    assert_eq!(session_token(&session).as_deref(), Some("T1"));
}

#[tokio::test]
async fn login_rejection_leaves_session_anonymous() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (client, session) = test_client(&server.uri(), "/auth/resend-otp");

    let result = client.login("a@b.com", "wrong").await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(session_token(&session), None);
}

#[tokio::test]
async fn verify_otp_establishes_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/signup/verify"))
        .and(body_json(json!({ "email": "a@b.com", "otp": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "T2",
            "user": { "email": "a@b.com" }
        })))
        .mount(&server)
        .await;

    let (client, session) = test_client(&server.uri(), "/auth/resend-otp");

    let data = client
        .verify_otp("a@b.com", "123456")
        .await
        .expect("OTP verification failed");
    assert_eq!(data.token, "T2");
    assert_eq!(session_token(&session).as_deref(), Some("T2"));
}

#[tokio::test]
async fn invalid_otp_passes_through_as_rejection() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/signup/verify"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid or expired OTP"))
        .mount(&server)
        .await;

    let (client, session) = test_client(&server.uri(), "/auth/resend-otp");

    match client.verify_otp("a@b.com", "000000").await {
        Err(ApiError::Rejected { status, body }) => {
            assert_eq!(status, 422);
            assert_eq!(body, "invalid or expired OTP");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert_eq!(session_token(&session), None);
}

#[tokio::test]
async fn resend_otp_honors_configured_path() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    // Deployment where resending means re-POSTing the signup endpoint
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_json(json!({ "email": "a@b.com" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _session) = test_client(&server.uri(), "/auth/signup");
    client.resend_otp("a@b.com").await.expect("Resend failed");
}

#[tokio::test]
async fn logout_clears_session_locally() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    let (client, session) = test_client(&server.uri(), "/auth/resend-otp");
    session
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .update(seeded_session_data("T1"));
    assert!(client.is_authenticated());

    client.logout();
    assert!(!client.is_authenticated());
    assert_eq!(session_token(&session), None);

    // No network traffic for logout
    let received = server
        .received_requests()
        .await
        .expect("Request recording disabled");
    assert!(received.is_empty());
}

#[tokio::test]
async fn connection_failure_surfaces_as_unreachable() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    // Reserve a port, then drop the listener so nothing is accepting
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind failed");
    let addr = listener.local_addr().expect("local_addr failed");
    drop(listener);

    let (client, _session) = test_client(&format!("http://{addr}"), "/auth/resend-otp");

    match client.login("a@b.com", "Secret1!").await {
        Err(e) => assert!(e.is_unreachable(), "expected unreachable, got {e:?}"),
        Ok(_) => panic!("expected connection failure"),
    }
}
