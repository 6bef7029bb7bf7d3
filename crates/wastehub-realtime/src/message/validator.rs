//! Message validation rules.

use wastehub_core::error::AppError;

/// Validates a raw inbound frame before parsing.
pub fn validate_inbound(raw: &str, max_bytes: usize) -> Result<(), AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Validates room key format before it is parsed.
pub fn validate_room_key(room: &str) -> Result<(), AppError> {
    if room.is_empty() || room.len() > 128 {
        return Err(AppError::validation("Invalid room name length"));
    }

    if !room
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.' | ','))
    {
        return Err(AppError::validation("Room name contains invalid characters"));
    }

    Ok(())
}
