//! Name checks applied before any list or todo is stored.

use crate::error::{NameError, NAME_MAX_CHARS, NAME_MIN_CHARS};

/// Trim user input the way every route does before validating or storing it.
pub fn normalize_name(raw: &str) -> &str {
    raw.trim()
}

/// Check a list name against the length rule and the names already in use.
///
/// `name` is expected to be trimmed already. The comparison is exact and
/// case-sensitive.
pub fn validate_name<'a, I>(name: &str, existing_names: I) -> Result<(), NameError>
where
    I: IntoIterator<Item = &'a str>,
{
    check_name(name)?;
    if existing_names.into_iter().any(|existing| existing == name) {
        return Err(NameError::Duplicate);
    }
    Ok(())
}

/// Todo names only need to satisfy the length and character rules.
pub fn validate_todo_name(name: &str) -> Result<(), NameError> {
    check_name(name)
}

fn check_name(name: &str) -> Result<(), NameError> {
    let length = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
        return Err(NameError::Length);
    }
    // PostgreSQL text columns reject NUL, so both stores refuse control characters.
    if name.chars().any(char::is_control) {
        return Err(NameError::ControlCharacter);
    }
    Ok(())
}
