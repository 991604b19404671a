#![allow(clippy::unwrap_used)]
// Integration tests for login and avatar upload using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portal_api::{Error, FailureKind, LoginClient, UploadClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(name: &str) -> (MockServer, Url) {
    let server = MockServer::start().await;
    let url = Url::parse(&format!("{}/{name}", server.uri())).unwrap();
    (server, url)
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, url) = setup("login").await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("email=ada%40example.com"))
        .and(body_string_contains("accessCode=8765"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "userToken": "user-1",
            "authToken": "auth-1",
            "expirationTime": 1_900_000_000,
            "abilities": ["debug"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LoginClient::new(reqwest::Client::new(), url);
    let data = client
        .login("ada@example.com", &SecretString::from("8765"))
        .await
        .unwrap();

    assert_eq!(data.user_token, "user-1");
    assert_eq!(data.auth_token, "auth-1");
    assert_eq!(data.expiration_time, 1_900_000_000);
    assert_eq!(data.abilities, vec!["debug".to_owned()]);
}

#[tokio::test]
async fn test_login_wrong_access_code_is_user_error() {
    let (server, url) = setup("login").await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "Invalid access code" })),
        )
        .mount(&server)
        .await;

    let client = LoginClient::new(reqwest::Client::new(), url);
    let err = client
        .login("ada@example.com", &SecretString::from("0000"))
        .await
        .unwrap_err();

    assert!(err.is_user_error());
    assert_eq!(err.to_string(), "Request rejected by the server: Invalid access code");
}

#[tokio::test]
async fn test_login_server_error_is_not_user_error() {
    let (server, url) = setup("login").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = LoginClient::new(reqwest::Client::new(), url);
    let err = client
        .login("ada@example.com", &SecretString::from("8765"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 502, .. }));
    assert!(err.is_transient());
    assert!(!err.is_user_error());
}

// ── Upload ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_avatar_sends_multipart() {
    let (server, url) = setup("upload").await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"authToken\""))
        .and(body_string_contains("name=\"photo\"; filename=\"avatar.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = UploadClient::new(reqwest::Client::new(), url);
    client
        .upload_avatar(&SecretString::from("auth-1"), "avatar.png", b"PNGDATA".to_vec())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_avatar_rejected() {
    let (server, url) = setup("upload").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let client = UploadClient::new(reqwest::Client::new(), url);
    let err = client
        .upload_avatar(&SecretString::from("auth-1"), "avatar.png", Vec::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Rejected);
}
