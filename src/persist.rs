use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::message::ChannelMessage;

/// Write the collected messages to `{channel}_{YYYYMMDD_HHMMSS}.json`
/// inside `dir` and return the path written.
///
/// Messages are sorted ascending by id, with an absent id ordering as 0.
/// That can place id-less records ahead of their true chronological
/// position; callers get the raw display data either way.
pub fn save_messages(
    messages: &[ChannelMessage],
    channel: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_{}.json", channel, timestamp));

    let json = render_json(messages)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;

    println!(
        "\nSuccessfully saved {} messages to {}",
        messages.len(),
        path.display()
    );
    Ok(path)
}

/// Render the sorted record array as pretty-printed JSON. Non-ASCII text
/// is kept literal and field order follows the struct declaration, so
/// the same input always renders to identical bytes.
fn render_json(messages: &[ChannelMessage]) -> Result<String> {
    let mut sorted: Vec<&ChannelMessage> = messages.iter().collect();
    // Stable sort keeps document order among equal keys.
    sorted.sort_by_key(|m| m.sort_id());

    let json = serde_json::to_string_pretty(&sorted).context("failed to serialize messages")?;
    Ok(json)
}
