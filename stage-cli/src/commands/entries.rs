//! Relay operations: copy, move, paste, list.

use anyhow::{Context, Result};
use stage_client::StageClient;
use stage_types::{EntryId, Target};
use std::io::{Read, Write};

/// Parse an optional `--id` into a target (oldest when absent).
pub fn parse_target(id: Option<&str>) -> Result<Target> {
    match id {
        None => Ok(Target::Oldest),
        Some(text) => {
            let id: EntryId = text.parse().context("Invalid entry id")?;
            if id.is_zero() {
                anyhow::bail!("Entry id must not be zero");
            }
            Ok(Target::Specific(id))
        }
    }
}

/// Read content piped into `copy`.
pub fn read_input(input: &mut impl Read) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    input.read_to_end(&mut data).context("Failed to read stdin")?;
    if data.is_empty() {
        anyhow::bail!("Nothing to copy: stdin was empty");
    }
    Ok(data)
}

/// Stage `data` and print its id.
pub async fn copy(out: &mut impl Write, client: &StageClient, data: &[u8]) -> Result<()> {
    let id = client.copy(data).await.context("Copy failed")?;
    writeln!(out, "{}", id)?;
    Ok(())
}

/// Take an entry off the relay and write its content.
pub async fn move_entry(out: &mut impl Write, client: &StageClient, id: Option<&str>) -> Result<()> {
    let target = parse_target(id)?;
    let content = client
        .move_entry(target)
        .await
        .context("Move failed")?
        .with_context(|| format!("No staged entry ({})", target))?;
    out.write_all(&content)?;
    Ok(())
}

/// Read an entry and write its content.
pub async fn paste(out: &mut impl Write, client: &StageClient, id: Option<&str>) -> Result<()> {
    let target = parse_target(id)?;
    let content = client
        .paste(target)
        .await
        .context("Paste failed")?
        .with_context(|| format!("No staged entry ({})", target))?;
    out.write_all(&content)?;
    Ok(())
}

/// Print every staged id, oldest first.
pub async fn list(out: &mut impl Write, client: &StageClient) -> Result<()> {
    for id in client.list().await.context("List failed")? {
        writeln!(out, "{}", id)?;
    }
    Ok(())
}
