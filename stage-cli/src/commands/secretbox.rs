//! Seal and open messages by hand, for debugging a deployment's shared key.

use anyhow::{Context, Result};
use stage_core::SharedKey;
use std::io::Write;

fn parse_key(hex_key: &str) -> Result<SharedKey> {
    let bytes = hex::decode(hex_key.trim()).context("Key is not valid hex")?;
    SharedKey::from_bytes(&bytes).context("Invalid key")
}

/// Seal `message` and print the box as hex.
pub fn seal(out: &mut impl Write, hex_key: &str, message: &[u8]) -> Result<()> {
    let key = parse_key(hex_key)?;
    let sealed = key.seal(message)?;
    writeln!(out, "{}", hex::encode(sealed))?;
    Ok(())
}

/// Open a hex box and print the message.
pub fn open(out: &mut impl Write, hex_key: &str, hex_sealed: &str) -> Result<()> {
    let key = parse_key(hex_key)?;
    let sealed = hex::decode(hex_sealed.trim()).context("Sealed box is not valid hex")?;
    let message = key.open(&sealed).context("Failed to open sealed box")?;
    out.write_all(&message)?;
    writeln!(out)?;
    Ok(())
}
