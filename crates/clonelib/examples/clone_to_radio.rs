//! Write a saved memory image back into a radio.
//!
//! Loads an image produced by the `clone_from_radio` example, checks it
//! against the radio descriptor, and clones it into the radio.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p clonelib --example clone_to_radio -- IC-2820H /dev/ttyUSB0 ic2820h.img
//! ```

use std::time::Duration;

use anyhow::{Context, bail};
use clonelib::MemoryMap;
use clonelib::icom::CloneBuilder;
use clonelib::icom::models::by_name;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let model = args.next().unwrap_or_else(|| "IC-2820H".to_string());
    let serial_port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let input = args.next().unwrap_or_else(|| "radio.img".to_string());

    let radio = by_name(&model).with_context(|| format!("unknown radio model {model}"))?;
    let bytes = std::fs::read(&input).with_context(|| format!("reading {input}"))?;
    if bytes.len() != radio.memsize {
        bail!(
            "{input} is {} bytes but the {} image is {} bytes",
            bytes.len(),
            radio.name,
            radio.memsize
        );
    }

    println!("Writing {} to {} on {}...", input, radio.name, serial_port);

    // Slow USB adapters sometimes need a longer pause between data frames.
    let mut session = CloneBuilder::new(&radio)
        .serial_port(&serial_port)
        .write_pacing(Duration::from_millis(10))
        .build()
        .await?;

    session
        .clone_to_radio(&MemoryMap::from_bytes(bytes))
        .await?;
    println!("Clone complete ({:?})", session.state());
    Ok(())
}
