//! CLI Status Command
//!
//! Reports whether a server is up and ready to accept detections.

use anyhow::Result;

use crate::terminal_output::{note_error, note_success, note_warn};

pub async fn run(base_url: &str) -> Result<()> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let resp = match reqwest::Client::new().get(&url).send().await {
        Ok(resp) => resp,
        Err(_) => {
            note_error(&format!("roachwatch is not running at {base_url}"));
            return Ok(());
        }
    };

    let body: serde_json::Value = resp.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if body["configured"].as_bool().unwrap_or(false) {
        note_success("Ready to accept detections");
    } else {
        let missing: Vec<&str> = body["missing"]
            .as_array()
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default();
        note_warn(&format!("Detection disabled; missing {}", missing.join(", ")));
    }
    Ok(())
}
