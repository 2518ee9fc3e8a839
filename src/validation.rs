use crate::error::AppError;

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Test names end up in element ids and URL bodies; whitespace would split them.
pub fn require_test_name(value: &str) -> Result<(), AppError> {
    require_non_empty("test name", value)?;
    if value.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "test name '{value}' must not contain whitespace"
        )));
    }
    Ok(())
}
