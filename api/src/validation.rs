use anyhow::{bail, Result};

pub const BOT_STATUSES: &[&str] = &["ENABLED", "DISABLED", "PAUSED"];
pub const WORKER_STATUSES: &[&str] = &["RUNNING", "STOPPED", "ERROR"];
pub const LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARN", "ERROR"];

const MAX_NAME_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const MAX_MESSAGE_CHARS: usize = 5000;

/// Validate an entity name
/// Rules:
/// - Non-empty after trimming
/// - At most 100 characters
/// - Returns the trimmed name
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim().to_string();
    if trimmed.is_empty() {
        bail!("Name cannot be empty");
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        bail!("Name is too long (max {} characters)", MAX_NAME_CHARS);
    }
    Ok(trimmed)
}

pub fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        bail!(
            "Description is too long (max {} characters)",
            MAX_DESCRIPTION_CHARS
        );
    }
    Ok(())
}

pub fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Message cannot be empty");
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        bail!("Message is too long (max {} characters)", MAX_MESSAGE_CHARS);
    }
    Ok(())
}

fn validate_choice(kind: &str, value: &str, choices: &[&str]) -> Result<()> {
    if !choices.contains(&value) {
        bail!("Invalid {}. Must be one of: {}", kind, choices.join(", "));
    }
    Ok(())
}

pub fn validate_bot_status(status: &str) -> Result<()> {
    validate_choice("bot status", status, BOT_STATUSES)
}

pub fn validate_worker_status(status: &str) -> Result<()> {
    validate_choice("worker status", status, WORKER_STATUSES)
}

pub fn validate_log_level(level: &str) -> Result<()> {
    validate_choice("log level", level, LOG_LEVELS)
}
