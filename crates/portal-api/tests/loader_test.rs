#![allow(clippy::unwrap_used)]
// Integration tests for the remote data loaders using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use serde_json::json;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::{Context, SubscriberExt};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portal_api::{
    ContentLoader, EnvironmentLoader, EventLoader, FailureKind, LoadState, NotLoaded, ShiftKind,
    UserLoader,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Counts WARN events emitted on the current thread.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn capture_diagnostics() -> (Arc<AtomicUsize>, DefaultGuard) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
    let guard = tracing::subscriber::set_default(subscriber);
    (count, guard)
}

fn endpoint(server: &MockServer, name: &str) -> Url {
    Url::parse(&format!("{}/{name}", server.uri())).unwrap()
}

fn environment_body() -> serde_json::Value {
    json!({
        "success": true,
        "eventName": "Example Event",
        "portalTitle": "Example Title",
        "seniorTitle": "Example Senior",
        "timezone": "Europe/London",
        "year": 2019
    })
}

fn event_body(version: &str) -> serde_json::Value {
    json!({
        "success": true,
        "version": version,
        "events": [{
            "id": "opening",
            "title": "Opening Ceremony",
            "sessions": [{ "location": "main-hall", "startTime": 1_560_000_000, "endTime": 1_560_003_600 }]
        }],
        "locations": [{ "id": "main-hall", "name": "Main Hall", "area": "North", "floor": 0 }],
        "floors": [{ "id": 0, "name": "Ground floor" }],
        "volunteers": [{
            "userToken": "user-1",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "shifts": [
                { "type": "event", "event": "opening", "startTime": 1_560_000_000, "endTime": 1_560_003_600 },
                { "type": "available", "startTime": 1_559_990_000, "endTime": 1_560_000_000 }
            ]
        }]
    })
}

// ── Environment ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_environment_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .mount(&server)
        .await;

    let loader = EnvironmentLoader::new(reqwest::Client::new(), endpoint(&server, "environment"));

    assert!(loader.initialize().await);
    assert_eq!(loader.state(), LoadState::Loaded);
    assert_eq!(loader.year().unwrap(), 2019);
    assert_eq!(loader.timezone().unwrap(), "Europe/London");
    assert_eq!(loader.event_name().unwrap(), "Example Event");
    assert_eq!(loader.portal_title().unwrap(), "Example Title");
    assert_eq!(loader.senior_title().unwrap(), "Example Senior");

    // Accessors do not mutate the snapshot.
    assert_eq!(loader.year().unwrap(), loader.year().unwrap());
}

#[tokio::test]
async fn test_environment_http_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let loader = EnvironmentLoader::new(reqwest::Client::new(), endpoint(&server, "environment"));
    let (diagnostics, _guard) = capture_diagnostics();

    assert!(!loader.initialize().await);
    assert_eq!(diagnostics.load(Ordering::SeqCst), 1);
    assert_eq!(loader.last_failure(), Some(FailureKind::Transport));
    assert!(!loader.is_user_error());
    assert_eq!(
        loader.year().unwrap_err(),
        NotLoaded {
            type_name: "EnvironmentData"
        }
    );
    assert!(loader.timezone().is_err());
    assert!(loader.event_name().is_err());
    assert!(loader.portal_title().is_err());
    assert!(loader.senior_title().is_err());
}

#[tokio::test]
async fn test_transport_errors_omit_query_parameters() {
    // Nothing listens on the discard port.
    let loader = EventLoader::new(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9/event").unwrap(),
    );

    let err = loader
        .fetch(&[("authToken", "SECRET-TOKEN")])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Transport);
    assert!(err.is_transient());
    assert!(!err.to_string().contains("SECRET-TOKEN"), "{err}");
    assert!(!format!("{err:?}").contains("SECRET-TOKEN"));
}

#[tokio::test]
async fn test_environment_wrong_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fruit": "banana" })))
        .mount(&server)
        .await;

    let loader = EnvironmentLoader::new(reqwest::Client::new(), endpoint(&server, "environment"));
    let (diagnostics, _guard) = capture_diagnostics();

    let err = loader.fetch(&[]).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Unable to validate EnvironmentData.success: property is missing"
    );
    assert_eq!(diagnostics.load(Ordering::SeqCst), 1);
    assert_eq!(loader.last_failure(), Some(FailureKind::Validation));
    assert!(!loader.is_loaded());
}

#[tokio::test]
async fn test_environment_mistyped_field() {
    let server = MockServer::start().await;
    let mut body = environment_body();
    body["year"] = json!("2019");
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let loader = EnvironmentLoader::new(reqwest::Client::new(), endpoint(&server, "environment"));
    let (diagnostics, _guard) = capture_diagnostics();

    assert!(!loader.initialize().await);
    assert_eq!(diagnostics.load(Ordering::SeqCst), 1);
    assert!(loader.year().is_err());
}

#[tokio::test]
async fn test_non_json_body_is_format_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let loader = EnvironmentLoader::new(reqwest::Client::new(), endpoint(&server, "environment"));
    let (diagnostics, _guard) = capture_diagnostics();

    assert!(!loader.initialize().await);
    assert_eq!(diagnostics.load(Ordering::SeqCst), 1);
    assert_eq!(loader.last_failure(), Some(FailureKind::Format));
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let loader = EnvironmentLoader::new(reqwest::Client::new(), endpoint(&server, "environment"));

    assert!(loader.initialize().await);
    assert!(!loader.initialize().await);
    assert_eq!(loader.state(), LoadState::Failed(FailureKind::Transport));
    assert_eq!(loader.year().unwrap(), 2019);
}

// ── Failure sentinel ────────────────────────────────────────────────

#[tokio::test]
async fn test_success_false_is_user_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .and(query_param("authToken", "stale"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "Session expired" })),
        )
        .mount(&server)
        .await;

    let loader = EventLoader::new(reqwest::Client::new(), endpoint(&server, "event"));

    let err = loader.fetch(&[("authToken", "stale")]).await.unwrap_err();

    assert!(err.is_user_error());
    assert!(loader.is_user_error());
    assert_eq!(loader.last_failure(), Some(FailureKind::Rejected));
    assert!(loader.version().is_err());
}

// ── Event ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_event_accessors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .and(query_param("authToken", "auth-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("v1")))
        .mount(&server)
        .await;

    let loader = EventLoader::new(reqwest::Client::new(), endpoint(&server, "event"));

    assert!(loader.load(&[("authToken", "auth-1")]).await);
    assert_eq!(loader.version().unwrap(), "v1");
    assert_eq!(loader.events().unwrap().len(), 1);
    assert_eq!(
        loader.location("main-hall").unwrap().unwrap().area.as_deref(),
        Some("North")
    );
    assert_eq!(loader.floors().unwrap()[0].name, "Ground floor");
    assert!(loader.event("missing").unwrap().is_none());

    let volunteer = loader.volunteer("user-1").unwrap().unwrap();
    assert_eq!(volunteer.full_name(), "Ada Lovelace");

    let shifts = loader.shifts_for("user-1").unwrap();
    assert_eq!(shifts[0].kind, ShiftKind::Available);
    assert_eq!(shifts[1].event.as_deref(), Some("opening"));
}

#[tokio::test]
async fn test_concurrent_loads_leave_valid_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("v1")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("v2")))
        .mount(&server)
        .await;

    let loader = Arc::new(EventLoader::new(
        reqwest::Client::new(),
        endpoint(&server, "event"),
    ));

    let (a, b) = tokio::join!(loader.load(&[]), loader.load(&[]));

    assert!(a && b);
    let snapshot = loader.data().unwrap();
    assert!(snapshot.version == "v1" || snapshot.version == "v2");
    assert_eq!(snapshot.volunteers.len(), 1);
}

// ── Content ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_content_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "pages": [
                { "slug": "help", "title": "Help", "content": "<p>Ask a senior.</p>", "modified": 1 },
                { "slug": "contact", "title": "Contact", "content": "<p>Call us.</p>", "modified": 2 }
            ]
        })))
        .mount(&server)
        .await;

    let loader = ContentLoader::new(reqwest::Client::new(), endpoint(&server, "content"));

    assert!(loader.content("help").is_err());
    assert!(loader.initialize().await);
    assert_eq!(loader.pages().unwrap().len(), 2);
    assert_eq!(
        loader.content("help").unwrap().as_deref(),
        Some("<p>Ask a senior.</p>")
    );
    assert_eq!(loader.content("missing").unwrap(), None);
}

// ── User ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_user_loader_rejects_bad_abilities() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "userToken": "u",
            "authToken": "a",
            "expirationTime": 1,
            "abilities": ["debug", 3]
        })))
        .mount(&server)
        .await;

    let loader = UserLoader::new(reqwest::Client::new(), endpoint(&server, "login"));
    let (diagnostics, _guard) = capture_diagnostics();

    let err = loader.fetch(&[("authToken", "a")]).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Unable to validate LoginData.abilities[1]: expected string, got number"
    );
    assert_eq!(diagnostics.load(Ordering::SeqCst), 1);
    assert!(loader.abilities().is_err());
}
