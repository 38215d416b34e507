// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Tests for the transport module.

#![allow(clippy::unwrap_used)]

use tl_core::protocol::{DownlinkMessage, UplinkMessage};

use super::Transport;
use crate::test_helpers::MockTransport;

#[tokio::test]
async fn mock_transport_connect_and_disconnect() {
    let mut transport = MockTransport::new();
    assert!(!transport.is_connected());

    transport.connect("ws://localhost:9100/ws").await.unwrap();
    assert!(transport.is_connected());

    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn mock_transport_send_recv() {
    let mut transport = MockTransport::new();
    transport.connect("ws://localhost:9100/ws").await.unwrap();

    let msg = UplinkMessage::ping(42.5);
    transport.send(&msg).await.unwrap();

    let outgoing = transport.get_outgoing();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0], msg);

    let pong = DownlinkMessage::from_json(r#"{"type":"pong","t":42.5}"#).unwrap();
    transport.queue_incoming(pong.clone());

    let received = transport.recv().await.unwrap();
    assert_eq!(received, Some(pong));

    let received = transport.recv().await.unwrap();
    assert!(received.is_none());
}

#[tokio::test]
async fn mock_transport_connect_fail() {
    let mut transport = MockTransport::new();
    transport.set_connect_fail(true);

    let result = transport.connect("ws://localhost:9100/ws").await;
    assert!(result.is_err());
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn websocket_transport_starts_disconnected() {
    let transport = super::WebSocketTransport::new();
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn websocket_transport_send_without_connection_fails() {
    let mut transport = super::WebSocketTransport::new();
    let msg = UplinkMessage::ping(1.0);
    let result = transport.send(&msg).await;
    assert!(matches!(result, Err(super::TransportError::ConnectionClosed)));
}

#[tokio::test]
async fn websocket_transport_recv_without_connection_fails() {
    let mut transport = super::WebSocketTransport::new();
    let result = transport.recv().await;
    assert!(matches!(result, Err(super::TransportError::ConnectionClosed)));
}
