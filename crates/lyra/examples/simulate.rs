//! Simulate one playback of a manifest over a fixed-rate link.
//!
//! ```
//! cargo run -p lyra --example simulate -- <manifest.json> [policy] [buffer_secs] [throughput_kbps]
//! ```
//!
//! `LYRA_CONFIG` may point at a JSON [`PlayerConfig`]; positional arguments
//! override it.

use std::{env, error::Error, sync::Arc};

use lyra::prelude::*;
use tracing::{info, metadata::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let mut args = env::args().skip(1);
    let Some(manifest_path) = args.next() else {
        return Err("usage: simulate <manifest.json> [policy] [buffer_secs] [throughput_kbps]".into());
    };

    let mut config = match env::var("LYRA_CONFIG") {
        Ok(path) => PlayerConfig::from_path(path)?,
        Err(_) => PlayerConfig::default(),
    };
    if let Some(policy) = args.next() {
        config.abr.policy = policy.parse()?;
    }
    if let Some(buffer_secs) = args.next() {
        config.session.buffer_capacity_secs = buffer_secs.parse()?;
    }
    if let Some(kbps) = args.next() {
        config.link_kbps = vec![kbps.parse()?];
    }
    if config.link_kbps.is_empty() {
        warn!("no link throughput configured, assuming 1500 kbps");
    }

    let manifest = Arc::new(Manifest::from_path(&manifest_path)?);
    info!(
        manifest = %manifest_path,
        policy = %config.abr.policy,
        bitrates = ?manifest.bitrates_kbps(),
        segments = manifest.total_segments(),
        "simulating playback"
    );

    let transport = config
        .simulated_transport()
        .unwrap_or_else(|| SimulatedTransport::constant(1500.0));
    let session = config.session(manifest, Arc::new(transport))?;

    let mut events = session.events().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Event::Abr(AbrEvent::Switched {
                segment_index,
                from_kbps,
                to_kbps,
            }) = event
            {
                info!(segment_index, from_kbps, to_kbps, "bitrate switch");
            }
        }
    });

    let report = session.run().await?;
    printer.abort();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
