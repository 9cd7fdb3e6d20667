//! Status command implementation.

use anyhow::{Context, Result};

use super::StatusArgs;

/// Run the status command.
pub async fn run(args: StatusArgs) -> Result<()> {
    let url = format!("{}/api/status", args.url.trim_end_matches('/'));

    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("cannot reach {url} - is the server running?"))?;

    let status: serde_json::Value = response
        .json()
        .await
        .context("status endpoint returned invalid JSON")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("FilePulse Status");
    println!("{}", "─".repeat(40));
    println!();
    println!("  File exists:    {}", field(&status, "file_exists"));
    println!("  File size:      {} bytes", field(&status, "file_size"));
    println!("  Version:        {}", field(&status, "version"));
    println!("  Last modified:  {}", field(&status, "last_modified"));
    println!("  Subscribers:    {}", field(&status, "connected_clients"));
    println!("  Watcher alive:  {}", field(&status, "watcher_alive"));
    println!();
    println!("  Preview: {}", field(&status, "current_content_preview"));
    println!();

    Ok(())
}

/// Render a JSON field for display, tolerating missing values.
fn field(value: &serde_json::Value, key: &str) -> String {
    match &value[key] {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
