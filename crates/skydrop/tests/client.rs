//! End-to-end tests: the real client against a fake scheduling server.

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use skydrop::prelude::*;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Fake server
// =========================================================================

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

struct FakeServer {
    base: String,
    listener: TcpListener,
}

impl FakeServer {
    async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
        let addr = listener.local_addr().expect("should have local addr");
        Self {
            base: format!("ws://{addr}"),
            listener,
        }
    }

    /// Accepts one client and returns its stream and the request path.
    async fn accept(self) -> (ServerWs, String) {
        let (stream, _) = self.listener.accept().await.expect("should accept");
        let path = Arc::new(Mutex::new(String::new()));
        let seen = Arc::clone(&path);
        let ws = tokio_tungstenite::accept_hdr_async(stream, move |req: &Request, resp: Response| {
            *seen.lock().unwrap() = req.uri().path().to_owned();
            Ok::<_, ErrorResponse>(resp)
        })
        .await
        .expect("upgrade should succeed");
        let path = path.lock().unwrap().clone();
        (ws, path)
    }
}

async fn send_json(ws: &mut ServerWs, value: serde_json::Value) {
    ws.send(Message::text(value.to_string())).await.expect("server send");
}

async fn recv_json(ws: &mut ServerWs) -> serde_json::Value {
    loop {
        let msg = ws.next().await.expect("stream open").expect("frame ok");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("client sent JSON");
        }
    }
}

/// Waits until the client closes its side.
async fn expect_client_close(ws: &mut ServerWs) {
    loop {
        match ws.next().await {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
            Some(Ok(Message::Text(text))) => panic!("unexpected frame after end: {text}"),
            Some(Ok(_)) => continue,
        }
    }
}

fn config(competition_mode: bool) -> SessionConfig {
    SessionConfig {
        entry_name: "greedy".into(),
        auth_token: "tok".into(),
        competition_mode,
    }
}

fn get_moves(orders: &[&str], drones: &[&str]) -> serde_json::Value {
    let pending: serde_json::Map<String, serde_json::Value> = orders
        .iter()
        .map(|o| ((*o).to_owned(), json!({"Hospital": "Bigtown"})))
        .collect();
    json!({"GetMoves": {"State": {
        "TimeOfDay": 3600,
        "PendingOrders": pending,
        "AvailableDroneIds": drones,
    }}})
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_testing_mode_run_over_websocket() {
    let server = FakeServer::bind().await;
    let base = server.base.clone();

    let script = tokio::spawn(async move {
        let (mut ws, path) = server.accept().await;
        assert_eq!(path, "/ws-testing");

        assert_eq!(
            recv_json(&mut ws).await,
            json!({"Handshake": {"AuthToken": "tok", "EntryName": "greedy"}})
        );
        send_json(&mut ws, json!({"HandshakeResult": {"IsOk": true, "Message": "hi"}})).await;
        send_json(&mut ws, json!({"StartScenarioRun": {"Scenario": {"MaxTime": 100}}})).await;

        send_json(
            &mut ws,
            get_moves(&["order-1", "order-2", "order-3"], &["drone-1", "drone-2"]),
        )
        .await;
        let moves = recv_json(&mut ws).await;

        send_json(
            &mut ws,
            json!({"EndScenarioRun": {"Stats": {"Values": {"delivered": 2}}}}),
        )
        .await;
        expect_client_close(&mut ws).await;
        moves
    });

    let outcome = connect_and_run(&base, config(false), GreedyPolicy)
        .await
        .expect("run should succeed");
    let moves = script.await.expect("server script should finish");

    assert!(outcome.is_success());
    assert_eq!(outcome.phase(), Phase::Done);
    assert_eq!(
        moves,
        json!({"Moves": {"Launches": [
            {"DroneId": "drone-1", "OrderIds": ["order-1"]},
            {"DroneId": "drone-2", "OrderIds": ["order-2"]},
        ]}})
    );
}

#[tokio::test]
async fn test_competition_mode_uses_competition_endpoint() {
    let server = FakeServer::bind().await;
    let base = server.base.clone();

    let script = tokio::spawn(async move {
        let (mut ws, path) = server.accept().await;
        assert_eq!(path, "/ws-competition");

        recv_json(&mut ws).await;
        send_json(&mut ws, json!({"HandshakeResult": {"IsOk": true}})).await;

        for _ in 0..2 {
            send_json(&mut ws, json!({"StartScenarioRun": {"Scenario": {}}})).await;
            send_json(&mut ws, get_moves(&["order-7"], &["drone-3"])).await;
            recv_json(&mut ws).await;
            send_json(&mut ws, json!({"EndScenarioRun": {"Stats": {}}})).await;
        }

        send_json(&mut ws, json!({"Close": {"IsOk": true, "Message": "bye"}})).await;
        expect_client_close(&mut ws).await;
    });

    let outcome = connect_and_run(&base, config(true), GreedyPolicy)
        .await
        .expect("run should succeed");
    script.await.expect("server script should finish");

    match outcome {
        SessionOutcome::Closed { is_ok, message, stats } => {
            assert!(is_ok);
            assert_eq!(message, "bye");
            assert_eq!(stats.scenarios_completed, 2);
            assert_eq!(stats.moves_sent, 2);
        }
        other => panic!("expected Closed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_handshake_over_websocket() {
    let server = FakeServer::bind().await;
    let base = server.base.clone();

    let script = tokio::spawn(async move {
        let (mut ws, _) = server.accept().await;
        recv_json(&mut ws).await;
        send_json(
            &mut ws,
            json!({"HandshakeResult": {"IsOk": false, "Message": "bad token"}}),
        )
        .await;
        expect_client_close(&mut ws).await;
    });

    let outcome = connect_and_run(&base, config(false), GreedyPolicy)
        .await
        .expect("rejection is not an error");
    script.await.expect("server script should finish");

    assert_eq!(
        outcome,
        SessionOutcome::Rejected {
            message: Some("bad token".into())
        }
    );
}

#[tokio::test]
async fn test_server_drop_is_transport_error() {
    let server = FakeServer::bind().await;
    let base = server.base.clone();

    let script = tokio::spawn(async move {
        let (mut ws, _) = server.accept().await;
        recv_json(&mut ws).await;
        send_json(&mut ws, json!({"HandshakeResult": {"IsOk": true}})).await;
        // Hang up without Close or EndScenarioRun.
        drop(ws);
    });

    let err = connect_and_run(&base, config(false), GreedyPolicy)
        .await
        .expect_err("a dropped server must fail the run");
    script.await.expect("server script should finish");

    assert!(matches!(
        err,
        SkydropError::Session(SessionError::Transport(_))
    ));
}

#[tokio::test]
async fn test_protocol_violation_surfaces_through_session_error() {
    let server = FakeServer::bind().await;
    let base = server.base.clone();

    let script = tokio::spawn(async move {
        let (mut ws, _) = server.accept().await;
        recv_json(&mut ws).await;
        send_json(&mut ws, json!({"Greeting": {"IsOk": true}})).await;
        expect_client_close(&mut ws).await;
    });

    let err = connect_and_run(&base, config(false), GreedyPolicy)
        .await
        .expect_err("an unknown message must fail the run");
    script.await.expect("server script should finish");

    assert!(matches!(
        err,
        SkydropError::Session(SessionError::Protocol(
            ProtocolError::UnrecognizedMessage { .. }
        ))
    ));
}

#[tokio::test]
async fn test_connect_failure_is_transport_error() {
    let server = FakeServer::bind().await;
    let base = server.base.clone();
    drop(server);

    let err = connect_and_run(&base, config(false), GreedyPolicy)
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, SkydropError::Transport(TransportError::ConnectFailed { .. })));
}
