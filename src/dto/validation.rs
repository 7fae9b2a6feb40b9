//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::models::JOIN_CODE_LENGTH;

/// Validates that a join code is exactly 6 uppercase alphanumeric characters.
///
/// # Examples
///
/// ```ignore
/// validate_join_code("A3X9QZ") // Ok
/// validate_join_code("a3x9qz") // Err - lowercase
/// validate_join_code("A3X9Q")  // Err - too short
/// ```
pub fn validate_join_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != JOIN_CODE_LENGTH {
        let mut err = ValidationError::new("join_code_length");
        err.message = Some(
            format!(
                "Join code must be exactly {} characters (got {})",
                JOIN_CODE_LENGTH,
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        let mut err = ValidationError::new("join_code_format");
        err.message = Some("Join code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_join_code_valid() {
        assert!(validate_join_code("A3X9QZ").is_ok());
        assert!(validate_join_code("000000").is_ok());
        assert!(validate_join_code("ZZZZZZ").is_ok());
    }

    #[test]
    fn test_validate_join_code_invalid_length() {
        assert!(validate_join_code("A3X9Q").is_err()); // too short
        assert!(validate_join_code("A3X9QZZ").is_err()); // too long
        assert!(validate_join_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_join_code_invalid_format() {
        assert!(validate_join_code("a3x9qz").is_err()); // lowercase
        assert!(validate_join_code("A3X9Q-").is_err()); // punctuation
        assert!(validate_join_code("A3X 9Q").is_err()); // space
    }
}
