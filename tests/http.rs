use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use ed25519_dalek::{Signer, SigningKey};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use crewtag::application::repos::TagsRepo;
use crewtag::application::tags::{TagDefaults, TagService};
use crewtag::infra::discord::InteractionVerifier;
use crewtag::infra::http::{HttpState, build_router};
use crewtag::infra::store::JsonTagStore;

const API_KEY: &str = "feed-secret";
const TIMESTAMP: &str = "1700000000";

struct Harness {
    _dir: TempDir,
    dir_path: std::path::PathBuf,
    router: Router,
    signer: SigningKey,
}

fn harness(api_key: Option<&str>, with_verifier: bool) -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let dir_path = dir.path().to_path_buf();
    let store = JsonTagStore::new(dir_path.clone()).expect("store");
    let repo: Arc<dyn TagsRepo> = Arc::new(store);
    let tags = Arc::new(TagService::new(repo, TagDefaults::default()));

    let signer = SigningKey::from_bytes(&[42u8; 32]);
    let verifier = with_verifier.then(|| {
        let public = hex::encode(signer.verifying_key().to_bytes());
        Arc::new(InteractionVerifier::from_hex(&public).expect("verifier"))
    });

    let router = build_router(HttpState {
        tags,
        api_key: api_key.map(Arc::from),
        verifier,
    });

    Harness {
        _dir: dir,
        dir_path,
        router,
        signer,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    (status, bytes.to_vec())
}

fn feed_request(path: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::empty()).expect("request should build")
}

fn signed_interaction(signer: &SigningKey, body: &Value) -> Request<Body> {
    let raw = serde_json::to_vec(body).expect("serialize interaction");
    let message = [TIMESTAMP.as_bytes(), raw.as_slice()].concat();
    let signature = hex::encode(signer.sign(&message).to_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/interactions")
        .header("content-type", "application/json")
        .header("x-signature-ed25519", signature)
        .header("x-signature-timestamp", TIMESTAMP)
        .body(Body::from(raw))
        .expect("request should build")
}

fn create_crew_tag(group_id: u64, tag: &str) -> Value {
    json!({
        "type": 2,
        "id": "990001",
        "guild_id": "880001",
        "member": { "user": { "id": "770001" } },
        "data": {
            "name": "createtag",
            "options": [{
                "type": 1,
                "name": "crew",
                "options": [
                    { "type": 4, "name": "groupid", "value": group_id },
                    { "type": 3, "name": "tag", "value": tag },
                    { "type": 3, "name": "color", "value": "255, 0, 0" },
                    { "type": 3, "name": "color2", "value": "0, 0, 255" },
                ],
            }],
        },
    })
}

fn embed(body: &[u8]) -> (String, u64, Option<u64>) {
    let value: Value = serde_json::from_slice(body).expect("json reply");
    assert_eq!(value["type"], 4);
    let data = &value["data"];
    (
        data["embeds"][0]["description"]
            .as_str()
            .expect("description")
            .to_string(),
        data["embeds"][0]["color"].as_u64().expect("color"),
        data["flags"].as_u64(),
    )
}

#[tokio::test]
async fn health_route_answers_ok() {
    let h = harness(Some(API_KEY), false);
    let (status, body) = send(&h.router, feed_request("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn feed_rejects_missing_or_wrong_api_key() {
    let h = harness(Some(API_KEY), false);

    for key in [None, Some("nope"), Some("feed-secret-but-longer")] {
        let (status, body) = send(&h.router, feed_request("/tags/groups", key)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "key {key:?}");
        let value: Value = serde_json::from_slice(&body).expect("json error");
        assert_eq!(value, json!({ "error": "unauthorized" }));
    }
}

#[tokio::test]
async fn feed_serves_empty_object_before_any_tag_exists() {
    let h = harness(Some(API_KEY), false);

    for path in ["/tags/groups", "/tags/users"] {
        let (status, body) = send(&h.router, feed_request(path, Some(API_KEY))).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).expect("json feed");
        assert_eq!(value, json!({}));
    }
}

#[tokio::test]
async fn feed_is_public_without_configured_key() {
    let h = harness(None, false);
    let (status, _) = send(&h.router, feed_request("/tags/users", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn feed_serves_the_stored_document_verbatim() {
    let h = harness(Some(API_KEY), false);
    let raw = r#"{
  "1": { "order": 0, "requiredRank": 1, "tagName": "a", "tagStyle": "s", "icon": "x" },
  "2": { "order": 0, "requiredRank": "255", "tagName": "b", "tagStyle": "s" }
}"#;
    std::fs::write(h.dir_path.join("group_tags.json"), raw).expect("seed document");

    let (status, body) = send(&h.router, feed_request("/tags/groups", Some(API_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    let served: Value = serde_json::from_slice(&body).expect("json feed");
    let stored: Value = serde_json::from_str(raw).expect("seed json");
    assert_eq!(served, stored);
}

#[tokio::test]
async fn corrupt_document_is_served_as_empty() {
    let h = harness(Some(API_KEY), false);
    std::fs::write(h.dir_path.join("group_tags.json"), "{ not json").expect("write corrupt file");

    let (status, body) = send(&h.router, feed_request("/tags/groups", Some(API_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).expect("json feed");
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn interactions_route_absent_without_public_key() {
    let h = harness(Some(API_KEY), false);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/interactions")
        .body(Body::from(r#"{"type":1}"#))
        .expect("request should build");

    let (status, _) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let h = harness(Some(API_KEY), true);
    let (status, body) = send(&h.router, signed_interaction(&h.signer, &json!({ "type": 1 }))).await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).expect("json reply");
    assert_eq!(value, json!({ "type": 1 }));
}

#[tokio::test]
async fn unsigned_or_tampered_interactions_are_rejected() {
    let h = harness(Some(API_KEY), true);

    let unsigned = Request::builder()
        .method(Method::POST)
        .uri("/interactions")
        .body(Body::from(r#"{"type":1}"#))
        .expect("request should build");
    let (status, _) = send(&h.router, unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let other = SigningKey::from_bytes(&[9u8; 32]);
    let (status, _) = send(&h.router, signed_interaction(&other, &json!({ "type": 1 }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn createtag_stores_rendered_markup_and_feeds_it() {
    let h = harness(Some(API_KEY), true);

    let (status, body) = send(
        &h.router,
        signed_interaction(&h.signer, &create_crew_tag(123, "Hi")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (description, color, flags) = embed(&body);
    assert_eq!(
        description,
        "Crew tag saved for Group ID 123. Roblox will auto-sync."
    );
    assert_eq!(color, 0x00FF00);
    assert_eq!(flags, None);

    let (status, body) = send(&h.router, feed_request("/tags/groups", Some(API_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    let feed: Value = serde_json::from_slice(&body).expect("json feed");
    let entry = &feed["123"];
    assert_eq!(
        entry["tagName"],
        r##"<font color="#FF0000">H</font><font color="#0000FF">i</font>"##
    );
    assert_eq!(entry["order"], 0);
    assert_eq!(entry["requiredRank"], 1);
    assert_eq!(entry["tagStyle"], "Discord");

    let on_disk = std::fs::read_to_string(h.dir_path.join("group_tags.json")).expect("file");
    let stored: Value = serde_json::from_str(&on_disk).expect("stored json");
    assert_eq!(stored["123"]["tagName"], entry["tagName"]);
}

#[tokio::test]
async fn createtag_duplicate_text_is_rejected_and_new_text_replaces() {
    let h = harness(Some(API_KEY), true);

    send(
        &h.router,
        signed_interaction(&h.signer, &create_crew_tag(7, "Crew")),
    )
    .await;

    let (_, body) = send(
        &h.router,
        signed_interaction(&h.signer, &create_crew_tag(7, "Crew")),
    )
    .await;
    let (_, color, flags) = embed(&body);
    assert_eq!(color, 0xFF0000);
    assert_eq!(flags, Some(64));

    let (_, body) = send(
        &h.router,
        signed_interaction(&h.signer, &create_crew_tag(7, "Renamed")),
    )
    .await;
    let (description, color, _) = embed(&body);
    assert_eq!(color, 0x00FF00);
    assert!(description.contains("updated"), "{description}");
}

#[tokio::test]
async fn createtag_reports_invalid_colors() {
    let h = harness(Some(API_KEY), true);
    let mut interaction = create_crew_tag(5, "Bad");
    interaction["data"]["options"][0]["options"][2]["value"] = json!("300, 0, 0");

    let (status, body) = send(&h.router, signed_interaction(&h.signer, &interaction)).await;
    assert_eq!(status, StatusCode::OK);
    let (description, color, flags) = embed(&body);
    assert!(description.starts_with("Invalid RGB"), "{description}");
    assert_eq!(color, 0xFF0000);
    assert_eq!(flags, Some(64));

    let (_, body) = send(&h.router, feed_request("/tags/groups", Some(API_KEY))).await;
    let feed: Value = serde_json::from_slice(&body).expect("json feed");
    assert_eq!(feed, json!({}));
}

#[tokio::test]
async fn deletetag_removes_entry_and_reports_missing() {
    let h = harness(Some(API_KEY), true);
    send(
        &h.router,
        signed_interaction(&h.signer, &create_crew_tag(55, "Gone")),
    )
    .await;

    let delete = json!({
        "type": 2,
        "data": {
            "name": "deletetag",
            "options": [{
                "type": 1,
                "name": "crew",
                "options": [{ "type": 4, "name": "groupid", "value": 55 }],
            }],
        },
    });

    let (_, body) = send(&h.router, signed_interaction(&h.signer, &delete)).await;
    let (description, color, _) = embed(&body);
    assert_eq!(description, "Crew tag deleted for Group ID 55.");
    assert_eq!(color, 0x00FF00);

    let (_, body) = send(&h.router, signed_interaction(&h.signer, &delete)).await;
    let (_, color, flags) = embed(&body);
    assert_eq!(color, 0xFF0000);
    assert_eq!(flags, Some(64));
}

#[tokio::test]
async fn exporttags_replies_with_ephemeral_literal_block() {
    let h = harness(Some(API_KEY), true);
    send(
        &h.router,
        signed_interaction(&h.signer, &create_crew_tag(9, "Hi")),
    )
    .await;

    let export = json!({
        "type": 2,
        "data": {
            "name": "exporttags",
            "options": [{ "type": 1, "name": "crew" }],
        },
    });

    let (_, body) = send(&h.router, signed_interaction(&h.signer, &export)).await;
    let (description, _, flags) = embed(&body);
    assert_eq!(flags, Some(64));
    assert!(description.starts_with("```lua\n"), "{description}");
    assert!(description.contains("[9] = { order = 0, requiredRank = 1"));
    assert!(description.ends_with("```"));
}

#[tokio::test]
async fn malformed_signed_body_is_bad_request() {
    let h = harness(Some(API_KEY), true);
    let raw = b"not json".to_vec();
    let message = [TIMESTAMP.as_bytes(), raw.as_slice()].concat();
    let signature = hex::encode(h.signer.sign(&message).to_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/interactions")
        .header("x-signature-ed25519", signature)
        .header("x-signature-timestamp", TIMESTAMP)
        .body(Body::from(raw))
        .expect("request should build");

    let (status, _) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
