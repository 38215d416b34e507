// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Tests for the reconnect module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::{
    ReconnectEvent, Reconnector, SharedLinkState, STATE_CONNECTED, STATE_DISCONNECTED,
    STATE_RECONNECTING,
};
use crate::client::LinkConfig;

/// A config pointing at a port nothing listens on, with fast retries.
fn unreachable_config(max_retries: u32) -> LinkConfig {
    LinkConfig {
        url: "ws://127.0.0.1:1/ws".to_string(),
        base_backoff_ms: 10,
        max_backoff_ms: 40,
        jitter_ms: 0,
        max_retries,
        ..LinkConfig::default()
    }
}

#[test]
fn shared_state_starts_disconnected() {
    let state = SharedLinkState::new();
    assert_eq!(state.get(), STATE_DISCONNECTED);
    assert_eq!(state.attempt(), 0);
    assert!(!state.is_connected());
}

#[test]
fn shared_state_transitions() {
    let state = SharedLinkState::new();

    state.set(STATE_CONNECTED);
    assert!(state.is_connected());
    assert_eq!(state.status_string(), "connected");

    state.set(STATE_RECONNECTING);
    state.set_attempt(3);
    assert!(!state.is_connected());
    assert_eq!(state.status_string(), "reconnecting (attempt 3)");

    state.set_attempt(0);
    assert_eq!(state.status_string(), "reconnecting");
}

#[tokio::test]
async fn reconnect_waits_before_first_attempt() {
    let shared = Arc::new(SharedLinkState::new());
    let (reconnector, mut event_rx) =
        Reconnector::new(unreachable_config(1), Arc::clone(&shared));

    reconnector.spawn_reconnect();

    let event = timeout(Duration::from_secs(5), event_rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        ReconnectEvent::Waiting { attempt, wait } => {
            assert_eq!(attempt, 1);
            assert_eq!(wait, Duration::from_millis(10));
        }
        other => panic!("expected Waiting, got {:?}", other),
    }
}

#[tokio::test]
async fn reconnect_gives_up_after_retry_budget() {
    let shared = Arc::new(SharedLinkState::new());
    let (reconnector, mut event_rx) =
        Reconnector::new(unreachable_config(2), Arc::clone(&shared));

    reconnector.spawn_reconnect();

    let mut waits = 0;
    loop {
        let event = timeout(Duration::from_secs(10), event_rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            ReconnectEvent::Waiting { .. } => waits += 1,
            ReconnectEvent::GaveUp { attempts, .. } => {
                assert_eq!(attempts, 2);
                break;
            }
            ReconnectEvent::Connected(_) => panic!("nothing listens on that port"),
        }
    }
    assert_eq!(waits, 2);
    assert_eq!(shared.get(), STATE_DISCONNECTED);
}

#[tokio::test]
async fn cancel_stops_pending_backoff() {
    let shared = Arc::new(SharedLinkState::new());
    let config = LinkConfig {
        url: "ws://127.0.0.1:1/ws".to_string(),
        base_backoff_ms: 60_000,
        max_backoff_ms: 60_000,
        jitter_ms: 0,
        max_retries: 0,
        ..LinkConfig::default()
    };
    let (mut reconnector, mut event_rx) = Reconnector::new(config, Arc::clone(&shared));

    reconnector.spawn_reconnect();

    // The task announces its backoff wait, then we cancel it mid-wait.
    let event = timeout(Duration::from_secs(5), event_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, ReconnectEvent::Waiting { attempt: 1, .. }));

    reconnector.cancel();
    assert_eq!(shared.get(), STATE_DISCONNECTED);
    assert_eq!(shared.attempt(), 0);

    // No connection or further waits ever arrive.
    let next = timeout(Duration::from_millis(200), event_rx.recv()).await;
    assert!(next.is_err() || next.unwrap().is_none());
}
