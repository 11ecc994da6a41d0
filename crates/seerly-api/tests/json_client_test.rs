// Integration tests for `JsonClient` using wiremock.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seerly_api::{Error, JsonClient, QueryChannel, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, JsonClient) {
    let server = MockServer::start().await;
    let url = url::Url::parse(&format!("{}/JSON", server.uri())).unwrap();
    let client =
        JsonClient::from_url(url, "default", "default", &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_get_status_all_devices() {
    let (server, client) = setup().await;

    let body = json!({
        "Devices": [
            {
                "ref": 190,
                "name": "Hall Lamp",
                "location": "Hall",
                "location2": "Ground Floor",
                "value": 0,
                "status": "Off",
                "device_type_string": "Z-Wave Switch Binary",
                "relationship": 4
            },
            { "ref": 191, "name": "Hall Lamp Battery", "value": 86, "status": "86%" }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/JSON"))
        .and(query_param("request", "getstatus"))
        .and(basic_auth("default", "default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let records = client.get_status(None).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].device_ref, Some(190));
    assert_eq!(records[0].name.as_deref(), Some("Hall Lamp"));
    assert_eq!(records[0].relationship, Some(4));
    assert_eq!(records[1].status.as_deref(), Some("86%"));
}

#[tokio::test]
async fn test_get_status_single_device_scopes_by_ref() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSON"))
        .and(query_param("request", "getstatus"))
        .and(query_param("ref", "190"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Devices": [{ "ref": 190, "name": "Hall Lamp", "value": 255, "status": "On" }]
        })))
        .mount(&server)
        .await;

    let records = client.get_status(Some(190)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value, Some(255.0));
}

#[tokio::test]
async fn test_get_control_pairs() {
    let (server, client) = setup().await;

    let body = json!({
        "Devices": [{
            "ref": 190,
            "ControlPairs": [
                { "ControlUse": 1, "Label": "On", "ControlValue": 255 },
                { "ControlUse": 2, "Label": "Off", "ControlValue": 0 }
            ]
        }]
    });

    Mock::given(method("GET"))
        .and(path("/JSON"))
        .and(query_param("request", "getcontrol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let records = client.get_control(None).await.unwrap();
    assert_eq!(records[0].control_pairs.len(), 2);
    assert_eq!(records[0].control_pairs[0].control_use, Some(1));
}

#[tokio::test]
async fn test_control_by_value() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSON"))
        .and(query_param("request", "controldevicebyvalue"))
        .and(query_param("ref", "190"))
        .and(query_param("value", "255"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": "ok"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.control_by_value(190, 255.0).await.unwrap();
}

#[tokio::test]
async fn test_run_event_posts_action() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/JSON"))
        .and(body_json(json!({
            "action": "runevent",
            "group": "Lighting",
            "name": "All Off"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Response": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    client.run_event("Lighting", "All Off").await.unwrap();
}

#[tokio::test]
async fn test_get_events() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSON"))
        .and(query_param("request", "getevents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Events": [
                { "Group": "Lighting", "Name": "All Off" },
                { "Group": "Security", "Name": "Arm Away" }
            ]
        })))
        .mount(&server)
        .await;

    let events = client.get_events().await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].group, "Security");
}

// ── Failure-path tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSON"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.get_status(None).await.unwrap_err();
    assert!(err.is_auth(), "expected auth error, got: {err}");
}

#[tokio::test]
async fn test_non_json_body_maps_to_deserialization_error() {
    let (server, client) = setup().await;

    // HomeSeer answers some malformed requests with an HTML error page
    // and HTTP 200.
    Mock::given(method("GET"))
        .and(path("/JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>error</html>"))
        .mount(&server)
        .await;

    let err = client.get_status(None).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("<html>")),
        other => panic!("expected Deserialization, got: {other}"),
    }
}

#[tokio::test]
async fn test_missing_devices_field_yields_empty_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let records = client.get_status(None).await.unwrap();
    assert!(records.is_empty());
}
