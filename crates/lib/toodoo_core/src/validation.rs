//! Input validation for names and email addresses.

use lettre::Address;

/// Maximum length, in characters, of list and item names.
pub const MAX_NAME_CHARS: usize = 150;

/// Validate a list or item name: non-blank and at most 150 characters once
/// trimmed, which is how it is stored.
pub fn validate_name(kind: &str, name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("{kind} name is required"));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(format!(
            "{kind} name must be at most {MAX_NAME_CHARS} characters"
        ));
    }
    Ok(())
}

/// Validate an email address with the same parser the mailer uses, so every
/// accepted address can receive its invitation.
pub fn validate_email(email: &str) -> Result<(), String> {
    email
        .parse::<Address>()
        .map(|_| ())
        .map_err(|_| format!("'{email}' is not a valid email address"))
}
