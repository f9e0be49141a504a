//! Read a radio's memory image and save it to a file.
//!
//! Demonstrates building a clone session on a serial port, following its
//! progress through the event stream, and writing the image to disk.
//!
//! # Requirements
//!
//! - An Icom radio with a clone cable, powered on and in clone mode
//! - The serial port path adjusted for your system (e.g., `/dev/ttyUSB0`
//!   on Linux, `COM3` on Windows)
//!
//! # Usage
//!
//! ```sh
//! cargo run -p clonelib --example clone_from_radio -- IC-2820H /dev/ttyUSB0 ic2820h.img
//! ```

use anyhow::Context;
use clonelib::CloneEvent;
use clonelib::icom::CloneBuilder;
use clonelib::icom::models::by_name;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let model = args.next().unwrap_or_else(|| "IC-2820H".to_string());
    let serial_port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let output = args.next().unwrap_or_else(|| "radio.img".to_string());

    let radio = by_name(&model).with_context(|| format!("unknown radio model {model}"))?;

    println!("Reading {} on {}...", radio.name, serial_port);

    let mut session = CloneBuilder::new(&radio)
        .serial_port(&serial_port)
        .build()
        .await?;

    // Print progress from a background task while the clone runs.
    let mut events = session.subscribe();
    let monitor = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                // Missed a few progress updates on a fast link; keep going.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match event {
                CloneEvent::Progress {
                    direction,
                    current,
                    total,
                } => {
                    println!("{direction}: {current:>6} / {total} bytes");
                }
                CloneEvent::StateChanged(state) => {
                    println!("[{state:?}]");
                    if state.is_terminal() {
                        break;
                    }
                }
            }
        }
    });

    let result = session.clone_from_radio().await;
    if let Some(info) = session.model_info() {
        println!("Radio reported {info}");
    }
    drop(session);
    monitor.await?;

    let image = result?;
    std::fs::write(&output, image.as_bytes())
        .with_context(|| format!("writing {output}"))?;
    println!("Saved {} bytes to {}", image.len(), output);
    Ok(())
}
