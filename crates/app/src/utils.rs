//! Utility functions for the ParaSummarizer popup
//!
//! Settings persistence, error wording, clipboard and display helpers.

use chrono::{DateTime, Local, Utc};
use shared::settings::SummarizerSettings;
use std::fs;
use std::path::PathBuf;

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "ParaSummarizer", "ParaSummarizer")
        .map(|proj| proj.config_dir().join("settings.json"))
}

/// Load settings from disk or return defaults, then apply env overrides.
///
/// The bool is true when a settings file was read.
pub fn load_settings_or_default() -> (SummarizerSettings, bool) {
    let from_disk = config_path().and_then(|path| {
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<SummarizerSettings>(&contents) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("ignoring unreadable {}: {}", path.display(), e);
                None
            }
        }
    });

    let found = from_disk.is_some();
    let settings = from_disk.unwrap_or_default().with_env_overrides();
    (settings, found)
}

/// Save settings to disk
pub fn save_settings(settings: &SummarizerSettings) -> anyhow::Result<()> {
    let path = config_path().ok_or_else(|| anyhow::anyhow!("no config directory"))?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&path, serde_json::to_vec_pretty(settings)?)?;
    Ok(())
}

/// Format error message with helpful troubleshooting info
pub fn format_error_message(error: &str) -> String {
    let error_lower = error.to_lowercase();

    // API key issues
    if error_lower.contains("unauthorized")
        || error_lower.contains("401")
        || error_lower.contains("invalid api key")
    {
        return format!(
            "The API key was rejected. Check it in Settings.\n\nError: {}",
            error
        );
    }

    // Rate limiting
    if error_lower.contains("rate limit")
        || error_lower.contains("429")
        || error_lower.contains("too many requests")
    {
        return format!(
            "The AI service is temporarily busy. Please wait a moment and try again.\n\nError: {}",
            error
        );
    }

    // Network issues
    if error_lower.contains("network")
        || error_lower.contains("connection")
        || error_lower.contains("timed out")
        || error_lower.contains("dns")
    {
        return format!(
            "Couldn't reach the AI service. Please check your network connection.\n\nError: {}",
            error
        );
    }

    // Quota/billing issues
    if error_lower.contains("quota") || error_lower.contains("billing") {
        return format!(
            "The API quota may have been exceeded.\n\nError: {}",
            error
        );
    }

    error.to_string()
}

/// Shorten text for list previews.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// "Oct 19, 03:45 PM" in local time.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%b %-d, %I:%M %p").to_string()
}

pub fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(text.to_string()).map_err(|e| e.to_string())
}
