// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Shared test helpers for link crate tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tl_core::fix::Fix;
use tl_core::protocol::{DownlinkMessage, UplinkMessage};

use crate::transport::{Transport, TransportError, TransportResult};

/// Create a validated fix at the given epoch seconds and receive time.
pub fn make_fix(t: f64, recv_ms: u64) -> Fix {
    Fix {
        t,
        recv_ms,
        lat: 37.7749,
        lon: -122.4194,
        spd: 5.0,
        hdg: Some(90.0),
        acc: Some(10.0),
        alt: None,
    }
}

/// Mock transport for testing without real sockets.
pub struct MockTransport {
    connected: bool,
    /// Messages that will be returned by recv().
    incoming: Arc<Mutex<VecDeque<DownlinkMessage>>>,
    /// Messages that were sent via send().
    outgoing: Arc<Mutex<Vec<UplinkMessage>>>,
    /// Whether the next connect should fail.
    connect_should_fail: bool,
    /// Whether sends should fail.
    send_should_fail: Arc<Mutex<bool>>,
    /// Sends accepted before failures kick in (when set).
    sends_before_fail: Arc<Mutex<Option<usize>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            connected: false,
            incoming: Arc::new(Mutex::new(VecDeque::new())),
            outgoing: Arc::new(Mutex::new(Vec::new())),
            connect_should_fail: false,
            send_should_fail: Arc::new(Mutex::new(false)),
            sends_before_fail: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a mock that is already connected.
    pub fn connected() -> Self {
        let mut transport = Self::new();
        transport.connected = true;
        transport
    }

    /// Add a message that will be returned by recv().
    pub fn queue_incoming(&self, msg: DownlinkMessage) {
        self.incoming.lock().unwrap().push_back(msg);
    }

    /// Get all messages that were sent.
    pub fn get_outgoing(&self) -> Vec<UplinkMessage> {
        self.outgoing.lock().unwrap().clone()
    }

    /// Set whether connect should fail.
    pub fn set_connect_fail(&mut self, fail: bool) {
        self.connect_should_fail = fail;
    }

    /// Set whether sends should fail.
    pub fn set_send_fail(&self, fail: bool) {
        *self.send_should_fail.lock().unwrap() = fail;
    }

    /// Accept `n` sends, then fail every send after that.
    pub fn fail_after(&self, n: usize) {
        *self.sends_before_fail.lock().unwrap() = Some(n);
    }
}

impl Transport for MockTransport {
    fn connect(
        &mut self,
        _url: &str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = TransportResult<()>> + Send + '_>>
    {
        Box::pin(async move {
            if self.connect_should_fail {
                Err(TransportError::ConnectionFailed("mock failure".into()))
            } else {
                self.connected = true;
                Ok(())
            }
        })
    }

    fn disconnect(
        &mut self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = TransportResult<()>> + Send + '_>>
    {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send<'a>(
        &'a mut self,
        msg: &'a UplinkMessage,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = TransportResult<()>> + Send + 'a>>
    {
        let outgoing = Arc::clone(&self.outgoing);
        let send_should_fail = Arc::clone(&self.send_should_fail);
        let sends_before_fail = Arc::clone(&self.sends_before_fail);
        Box::pin(async move {
            if *send_should_fail.lock().unwrap() {
                return Err(TransportError::SendFailed("mock send failure".into()));
            }
            if let Some(remaining) = sends_before_fail.lock().unwrap().as_mut() {
                if *remaining == 0 {
                    return Err(TransportError::SendFailed("mock send failure".into()));
                }
                *remaining -= 1;
            }
            outgoing.lock().unwrap().push(msg.clone());
            Ok(())
        })
    }

    fn recv(
        &mut self,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = TransportResult<Option<DownlinkMessage>>> + Send + '_>,
    > {
        let incoming = Arc::clone(&self.incoming);
        Box::pin(async move {
            let msg = incoming.lock().unwrap().pop_front();
            Ok(msg)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
