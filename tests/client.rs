// tests/client.rs
//
// Protocol client tests driven through the in-memory connector: the test
// plays the peer side of the handshake and command exchange through a
// scripted PeerEndpoint.

use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;

use hass_ws::{
    // ---
    create_memory_connector,
    Error,
    PeerEndpoint,
    WsClient,
    WsConfig,
};

const TOKEN: &str = "test-token";
const URL: &str = "ws://unit-test/api/websocket";

/// Accept one connection and play the peer's half of a successful
/// handshake: send the hello, check the auth message, confirm.
async fn accept_with_auth(peers: &mut mpsc::Receiver<PeerEndpoint>, version: &str) -> PeerEndpoint {
    // ---
    let mut peer = peers.recv().await.expect("no connection attempt");
    assert_eq!(peer.url, URL);

    peer.outbox
        .send(json!({"type": "auth_required", "ha_version": version}))
        .await
        .expect("client hung up before hello");

    let auth = peer.inbox.recv().await.expect("no auth message");
    assert_eq!(auth["type"], "auth");
    assert_eq!(auth["access_token"], TOKEN);

    peer.outbox
        .send(json!({"type": "auth_ok", "ha_version": version}))
        .await
        .expect("client hung up before auth result");

    peer
}

fn test_config() -> WsConfig {
    WsConfig::new().with_handshake_timeout(Duration::from_secs(1))
}

#[tokio::test]
async fn handshake_records_version_and_assigns_id_one() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    let peer_task = tokio::spawn(async move {
        let mut peer = accept_with_auth(&mut peers, "2024.1.0").await;

        let cmd = peer.inbox.recv().await.expect("no command");
        assert_eq!(cmd["id"], 1);
        assert_eq!(cmd["type"], "ping");

        peer.outbox
            .send(json!({"id": 1, "success": true, "result": {"x": 1}}))
            .await
            .unwrap();
    });

    let client = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &test_config())
        .await
        .expect("handshake failed");

    assert_eq!(client.ha_version(), "2024.1.0");

    let result = client.send_command(json!({"type": "ping"})).await.unwrap();
    assert_eq!(result, json!({"x": 1}));

    peer_task.await.unwrap();
}

#[tokio::test]
async fn auth_rejection_yields_auth_error() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    tokio::spawn(async move {
        let mut peer = peers.recv().await.unwrap();

        peer.outbox
            .send(json!({"type": "auth_required", "ha_version": "2024.1.0"}))
            .await
            .unwrap();

        let _auth = peer.inbox.recv().await.unwrap();

        peer.outbox
            .send(json!({"type": "auth_invalid", "message": "Invalid access token"}))
            .await
            .unwrap();

        // Keep the endpoint alive until the client has seen the rejection.
        let _ = peer.inbox.recv().await;
    });

    let err = WsClient::connect_with_auth(connector.as_ref(), URL, "wrong", &test_config())
        .await
        .expect_err("handshake should fail");

    match err {
        Error::Auth(message) => assert_eq!(message, "Invalid access token"),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn hello_with_wrong_type_fails_fast() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    tokio::spawn(async move {
        let mut peer = peers.recv().await.unwrap();

        peer.outbox
            .send(json!({"type": "event", "ha_version": "2024.1.0"}))
            .await
            .unwrap();

        let _ = peer.inbox.recv().await;
    });

    let err = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &test_config())
        .await
        .expect_err("handshake should fail");

    assert!(matches!(err, Error::Handshake(_)), "got {err:?}");
}

#[tokio::test]
async fn command_ids_are_sequential_without_gaps() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    tokio::spawn(async move {
        let mut peer = accept_with_auth(&mut peers, "2024.1.0").await;

        // Echo each command's wire id back so the client side can check
        // exactly what was sent.
        while let Some(cmd) = peer.inbox.recv().await {
            let id = cmd["id"].as_u64().unwrap();
            peer.outbox
                .send(json!({"id": id, "success": true, "result": {"echo_id": id}}))
                .await
                .unwrap();
        }
    });

    let client = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &test_config())
        .await
        .unwrap();

    for expected in 1..=5u64 {
        let result = client.send_command(json!({"type": "ping"})).await.unwrap();
        assert_eq!(result["echo_id"], expected);
    }
}

#[tokio::test]
async fn caller_supplied_id_is_overwritten() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    tokio::spawn(async move {
        let mut peer = accept_with_auth(&mut peers, "2024.1.0").await;

        let cmd = peer.inbox.recv().await.unwrap();
        assert_eq!(cmd["id"], 1, "protocol layer must own the id field");

        peer.outbox
            .send(json!({"id": 1, "success": true, "result": null}))
            .await
            .unwrap();
    });

    let client = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &test_config())
        .await
        .unwrap();

    let result = client
        .send_command(json!({"type": "ping", "id": 9999}))
        .await
        .unwrap();
    assert_eq!(result, Value::Null);
}

#[tokio::test]
async fn failure_response_carries_body_in_error() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    tokio::spawn(async move {
        let mut peer = accept_with_auth(&mut peers, "2024.1.0").await;

        let cmd = peer.inbox.recv().await.unwrap();
        peer.outbox
            .send(json!({"id": cmd["id"], "success": false, "error": "bad_request"}))
            .await
            .unwrap();

        let _ = peer.inbox.recv().await;
    });

    let client = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &test_config())
        .await
        .unwrap();

    let err = client
        .send_command(json!({"type": "bogus"}))
        .await
        .expect_err("command should be rejected");

    match err {
        Error::Command(body) => assert_eq!(body["error"], "bad_request"),
        other => panic!("expected Command error, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_commands_resolve_by_id_not_order() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    tokio::spawn(async move {
        let mut peer = accept_with_auth(&mut peers, "2024.1.0").await;

        // Collect both commands, then answer in reverse order. With
        // id-based correlation each caller still gets its own response.
        let first = peer.inbox.recv().await.unwrap();
        let second = peer.inbox.recv().await.unwrap();

        for cmd in [second, first] {
            peer.outbox
                .send(json!({
                    "id": cmd["id"],
                    "success": true,
                    "result": {"tag": cmd["tag"]},
                }))
                .await
                .unwrap();
        }
    });

    let client = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &test_config())
        .await
        .unwrap();

    let a = client.clone();
    let b = client.clone();

    let (res_a, res_b) = tokio::join!(
        a.send_command(json!({"type": "ping", "tag": "a"})),
        b.send_command(json!({"type": "ping", "tag": "b"})),
    );

    assert_eq!(res_a.unwrap()["tag"], "a");
    assert_eq!(res_b.unwrap()["tag"], "b");
}

#[tokio::test]
async fn silent_peer_times_out() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    let config = test_config().with_command_timeout(Duration::from_millis(100));

    // The task returns the endpoint so it stays alive past the timeout;
    // otherwise the failure would be a closed connection, not a timeout.
    let peer_task = tokio::spawn(async move {
        let mut peer = accept_with_auth(&mut peers, "2024.1.0").await;

        // Swallow the command and never answer.
        let _cmd = peer.inbox.recv().await.unwrap();
        peer
    });

    let client = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &config)
        .await
        .unwrap();

    let err = client
        .send_command(json!({"type": "ping"}))
        .await
        .expect_err("should time out");

    assert!(matches!(err, Error::Timeout), "got {err:?}");

    drop(peer_task.await.unwrap());
}

#[tokio::test]
async fn connection_loss_fails_inflight_command() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    tokio::spawn(async move {
        let mut peer = accept_with_auth(&mut peers, "2024.1.0").await;

        // Read the command, then hang up without answering.
        let _cmd = peer.inbox.recv().await.unwrap();
        drop(peer);
    });

    let client = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &test_config())
        .await
        .unwrap();

    let err = client
        .send_command(json!({"type": "ping"}))
        .await
        .expect_err("should observe the closed connection");

    assert!(matches!(err, Error::Closed), "got {err:?}");
    assert!(client.is_closed());
}

#[tokio::test]
async fn non_object_command_is_rejected() {
    // ---
    let (connector, mut peers) = create_memory_connector(16);

    tokio::spawn(async move {
        let peer = accept_with_auth(&mut peers, "2024.1.0").await;
        // Hold the connection open; no command should arrive.
        let _peer = peer;
        std::future::pending::<()>().await;
    });

    let client = WsClient::connect_with_auth(connector.as_ref(), URL, TOKEN, &test_config())
        .await
        .unwrap();

    let err = client
        .send_command(json!(["not", "an", "object"]))
        .await
        .expect_err("arrays are not commands");

    assert!(matches!(err, Error::InvalidCommand), "got {err:?}");
}
