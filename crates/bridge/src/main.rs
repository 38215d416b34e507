// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! tl-bridge: vehicle telemetry bridge.
//!
//! Reads GPS fixes from a location source, smooths them, and reports them
//! to a telemetry server over a resilient WebSocket link. Payloads that
//! cannot be sent are queued durably and replayed after reconnect.

mod tracker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tl_core::smooth::{SmootherConfig, SmoothingMode};
use tl_link::client::{LinkConfig, TelemetryLink};
use tl_link::location::{LocationSource, ReplaySource};
use tl_link::queue::UplinkQueue;
use tl_link::reconnect::{Reconnector, SharedLinkState};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use tracker::{Tracker, TrackerConfig};

/// tl-bridge: resilient GPS-to-telemetry uplink
#[derive(Parser, Debug)]
#[command(name = "tl-bridge")]
#[command(about = "Bridges a GPS fix source to a telemetry server")]
struct Args {
    /// Telemetry server URL
    #[arg(short, long, default_value = "ws://localhost:9100/ws")]
    url: String,

    /// Directory for the durable uplink queue
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Newline-delimited JSON file of raw fixes to replay
    #[arg(short, long)]
    replay: PathBuf,

    /// Delay between replayed fixes in milliseconds
    #[arg(long, default_value = "1000")]
    replay_interval: u64,

    /// How often the smoothed position is reported, in milliseconds
    #[arg(long, default_value = "1000")]
    report_interval: u64,

    /// Interpolate between fixes instead of holding the latest
    #[arg(long)]
    lerp: bool,

    /// Maximum reconnection attempts (0 = retry forever)
    #[arg(long, default_value = "0")]
    max_retries: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting tl-bridge");
    info!("  Server: {}", args.url);
    info!("  Data directory: {}", args.data.display());
    info!("  Replay file: {}", args.replay.display());

    let link_config = LinkConfig {
        url: args.url,
        max_retries: args.max_retries,
        ..LinkConfig::default()
    };

    let mut queue = UplinkQueue::open(UplinkQueue::default_path(&args.data));
    let depth = queue.init();
    if depth > 0 {
        info!("  Queued payloads from previous run: {depth}");
    }

    let mut link = TelemetryLink::new(link_config.clone());
    if let Err(e) = link.connect().await {
        // The reconnect path takes over from here.
        warn!("initial connection failed: {e}");
    }

    let shared = Arc::new(SharedLinkState::new());
    let (reconnector, reconnect_rx) = Reconnector::new(link_config, Arc::clone(&shared));

    let mut source = ReplaySource::new(
        &args.replay,
        Duration::from_millis(args.replay_interval),
    );
    let updates = source.start()?;

    let tracker_config = TrackerConfig {
        report_interval_ms: args.report_interval,
        smoother: SmootherConfig {
            mode: if args.lerp {
                SmoothingMode::Lerp
            } else {
                SmoothingMode::Hold
            },
            ..SmootherConfig::default()
        },
        ..TrackerConfig::default()
    };

    let tracker = Tracker::new(link, queue, tracker_config.clone());
    tracker::run(tracker, updates, reconnector, reconnect_rx, &tracker_config).await;

    source.stop();
    info!("tl-bridge stopped");
    Ok(())
}
