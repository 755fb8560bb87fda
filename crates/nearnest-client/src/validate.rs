use thiserror::Error;

/// Longest message body, in characters.
pub const BODY_MAX: usize = 500;

pub const HANDLE_MIN: usize = 3;
pub const HANDLE_MAX: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    #[error("Message is empty")]
    Empty,

    #[error("Message is {len} characters; the limit is {BODY_MAX}")]
    TooLong { len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("Handle must be at least {HANDLE_MIN} characters")]
    TooShort,

    #[error("Handle must be at most {HANDLE_MAX} characters")]
    TooLong,

    #[error("Handle may only contain letters, digits and underscores (found '{0}')")]
    InvalidChar(char),
}

/// Check a message body and return it trimmed.
pub fn validate_body(body: &str) -> Result<&str, BodyError> {
    let trimmed = body.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(BodyError::Empty);
    }
    if len > BODY_MAX {
        return Err(BodyError::TooLong { len });
    }
    Ok(trimmed)
}

/// Cut user input down to [`BODY_MAX`] characters, the way the input field
/// does before any validation.
pub fn truncate_body(input: &str) -> &str {
    match input.char_indices().nth(BODY_MAX) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Normalise a user-chosen handle: trimmed, lowercased, 3 to 20 characters
/// of `[a-z0-9_]`.
pub fn validate_handle(input: &str) -> Result<String, HandleError> {
    let handle = input.trim().to_lowercase();
    let len = handle.chars().count();
    if len < HANDLE_MIN {
        return Err(HandleError::TooShort);
    }
    if len > HANDLE_MAX {
        return Err(HandleError::TooLong);
    }
    if let Some(bad) = handle
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
    {
        return Err(HandleError::InvalidChar(bad));
    }
    Ok(handle)
}
